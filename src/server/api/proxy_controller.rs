use axum::{
    Router,
    body::Body,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::server::{
    error::{AppResult, Error},
    services::proxy_services::ProxyServices,
    utils::playlist_utils::PlaylistRewriter,
};

#[derive(Deserialize)]
struct ProxyQuery {
    src: Option<String>,
}

pub struct ProxyController;

impl ProxyController {
    pub fn app() -> Router {
        Router::new()
            .route("/hls", get(Self::hls_get).options(Self::proxy_options))
            .route("/mjpeg", get(Self::mjpeg_get).options(Self::proxy_options))
    }

    /// live manifests go stale in seconds, segments fetched through here shouldn't
    /// stick in intermediate caches either
    const MANIFEST_CACHE_CONTROL: &'static str = "no-store, max-age=0, must-revalidate";
    const PASSTHROUGH_CACHE_CONTROL: &'static str = "no-cache";

    async fn hls_get(
        Extension(services): Extension<ProxyServices>,
        Query(params): Query<ProxyQuery>,
        headers: HeaderMap,
        uri: Uri,
    ) -> AppResult<Response> {
        let src = Self::require_src(params)?;
        let proxy_origin = Self::proxy_origin(&headers, &uri)?;

        debug!("proxying hls: {}", src);

        let response = services.upstream.fetch(&src).await?;
        let final_url = response.url().clone();

        if Self::is_playlist(&final_url) {
            // manifests have to be fully in hand before a single line can be rewritten
            let text = response.text().await.map_err(|e| {
                error!("failed to read manifest body: {}", e);
                Error::UpstreamFetch(format!("Failed to read manifest: {}", e))
            })?;

            let rewritten = PlaylistRewriter::rewrite(&text, &final_url, &proxy_origin);
            debug!(
                "rewrote manifest {} ({} -> {} bytes)",
                final_url,
                text.len(),
                rewritten.len()
            );

            return Ok(Self::manifest_response(rewritten));
        }

        // segment, key or anything else binary: relay chunks as they arrive,
        // a 10s ts segment must never be materialized in full
        let content_type = Self::content_type_or(&response, "application/octet-stream");
        Ok(Self::stream_response(
            response,
            &content_type,
            Self::PASSTHROUGH_CACHE_CONTROL,
        ))
    }

    /// single-shot mjpeg relay, no manifest logic applies
    async fn mjpeg_get(
        Extension(services): Extension<ProxyServices>,
        Query(params): Query<ProxyQuery>,
    ) -> AppResult<Response> {
        let src = Self::require_src(params)?;

        debug!("proxying mjpeg: {}", src);

        let response = services.upstream.fetch(&src).await?;
        let content_type =
            Self::content_type_or(&response, "multipart/x-mixed-replace; boundary=frame");

        Ok(Self::stream_response(
            response,
            &content_type,
            Self::PASSTHROUGH_CACHE_CONTROL,
        ))
    }

    async fn proxy_options() -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }

    fn require_src(params: ProxyQuery) -> AppResult<String> {
        params
            .src
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MissingParameter("src".to_string()))
    }

    /// the origin rewritten urls must route back to, taken from the inbound request
    /// so the same binary works behind any hostname or reverse proxy
    fn proxy_origin(headers: &HeaderMap, uri: &Uri) -> AppResult<String> {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");

        // http/2 clients put the authority in the :authority pseudo-header, which
        // lands on the request uri rather than a Host header
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .ok_or_else(|| Error::BadRequest("Missing Host header".to_string()))?;

        Ok(format!("{}://{}", scheme, host))
    }

    /// playlist detection is on the final redirected url, not the requested one
    fn is_playlist(final_url: &Url) -> bool {
        final_url.path().to_ascii_lowercase().ends_with(".m3u8")
    }

    fn content_type_or(response: &reqwest::Response, fallback: &str) -> String {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(fallback)
            .to_string()
    }

    fn manifest_response(body: String) -> Response {
        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            header::CONTENT_TYPE,
            "application/vnd.apple.mpegurl"
                .parse()
                .expect("Static header value should parse"),
        );
        response_headers.insert(
            header::CACHE_CONTROL,
            Self::MANIFEST_CACHE_CONTROL
                .parse()
                .expect("Static header value should parse"),
        );

        (StatusCode::OK, response_headers, body).into_response()
    }

    fn stream_response(
        response: reqwest::Response,
        content_type: &str,
        cache_control: &str,
    ) -> Response {
        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            header::CONTENT_TYPE,
            content_type.parse().unwrap_or_else(|_| {
                "application/octet-stream"
                    .parse()
                    .expect("Static header value should parse")
            }),
        );
        response_headers.insert(
            header::CACHE_CONTROL,
            cache_control
                .parse()
                .expect("Static header value should parse"),
        );

        // once chunks start flowing an upstream error can only drop the connection,
        // the status line is long gone
        let stream = response
            .bytes_stream()
            .inspect_err(|e| error!("upstream body stream failed mid-flight: {}", e));
        let body = Body::from_stream(stream);

        (StatusCode::OK, response_headers, body).into_response()
    }
}
