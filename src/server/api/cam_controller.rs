use axum::{
    Router,
    body::Body,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::{debug, error};

use crate::server::{
    error::{AppResult, Error},
    services::proxy_services::ProxyServices,
};

#[derive(Deserialize)]
struct CamQuery {
    // overrides the configured camera base, ex: http://192.168.0.50
    base: Option<String>,
}

/// direct relays to the physical camera, no manifest rewriting involved
pub struct CamController;

impl CamController {
    pub fn app() -> Router {
        Router::new()
            .route("/stream", get(Self::stream_get))
            .route("/capture", get(Self::capture_get))
    }

    /// continuous mjpeg from the camera's streaming port
    async fn stream_get(
        Extension(services): Extension<ProxyServices>,
        Query(params): Query<CamQuery>,
    ) -> AppResult<Response> {
        let base = Self::resolve_base(&services, params)?;

        // esp32 convention: the stream lives on its own port, appended as ":81/stream",
        // so this is plain concatenation rather than url joining
        let target = format!("{}{}", base, services.config.cam_stream_path);
        debug!("relaying camera stream: {}", target);

        let response = services.upstream.fetch(&target).await?;
        Self::relay(response, "multipart/x-mixed-replace")
    }

    /// single still frame from the camera
    async fn capture_get(
        Extension(services): Extension<ProxyServices>,
        Query(params): Query<CamQuery>,
    ) -> AppResult<Response> {
        let base = Self::resolve_base(&services, params)?;

        let target = format!("{}{}", base, services.config.cam_snapshot_path);
        debug!("relaying camera snapshot: {}", target);

        let response = services.upstream.fetch(&target).await?;
        Self::relay(response, "image/jpeg")
    }

    fn resolve_base(services: &ProxyServices, params: CamQuery) -> AppResult<String> {
        params
            .base
            .filter(|b| !b.is_empty())
            .or_else(|| services.config.cam_base.clone())
            .ok_or_else(|| Error::BadRequest("Camera base URL not configured".to_string()))
    }

    fn relay(response: reqwest::Response, fallback_content_type: &str) -> AppResult<Response> {
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(fallback_content_type)
            .to_string();

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
            "no-cache".parse().expect("Static header value should parse"),
        );

        let stream = response
            .bytes_stream()
            .inspect_err(|e| error!("camera stream failed mid-flight: {}", e));
        let body = Body::from_stream(stream);
        Ok((StatusCode::OK, response_headers, body).into_response())
    }
}
