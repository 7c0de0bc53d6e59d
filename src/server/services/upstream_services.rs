use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use tracing::{debug, error};

use crate::server::error::{AppResult, Error};

use super::cookie_services::{CookieService, DynCookieService};

// many live-streaming origins refuse anything that doesn't look like a browser
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 Chrome/120 Safari/537.36";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.8,pt-BR;q=0.7";

pub type DynUpstreamService = Arc<dyn UpstreamServiceTrait + Send + Sync>;

#[async_trait::async_trait]
pub trait UpstreamServiceTrait {
    /// fetch with browser-like headers and jar-backed cookies, following redirects
    /// the returned response carries the final post-redirect url
    async fn fetch(&self, url: &str) -> AppResult<reqwest::Response>;
}

pub struct UpstreamService {
    http: reqwest::Client,
    cookies: DynCookieService,
    timeout: Duration,
}

impl UpstreamService {
    pub fn new(http: reqwest::Client, cookies: DynCookieService, timeout_secs: u64) -> Self {
        Self {
            http,
            cookies,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait::async_trait]
impl UpstreamServiceTrait for UpstreamService {
    async fn fetch(&self, url: &str) -> AppResult<reqwest::Response> {
        let target_origin = CookieService::extract_origin(url)
            .ok_or_else(|| Error::BadRequest("Invalid URL format".to_string()))?;

        let mut request_builder = self
            .http
            .get(url)
            .timeout(self.timeout)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(header::ORIGIN, target_origin.clone())
            .header(header::REFERER, format!("{}/", target_origin));

        if let Some(cookies) = self.cookies.get_cookies(&target_origin).await {
            debug!("attaching stored cookies for {}", target_origin);
            request_builder = request_builder.header(header::COOKIE, cookies);
        }

        let response = request_builder.send().await.map_err(|e| {
            error!("upstream request failed: {}", e);
            Error::UpstreamFetch(format!("Request failed: {}", e))
        })?;

        // cookies belong to whoever actually answered, which after a cross-origin
        // redirect is not the origin we asked
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
            .collect();

        if !set_cookies.is_empty() {
            if let Some(final_origin) = CookieService::extract_origin(response.url().as_str()) {
                self.cookies.store_cookies(&final_origin, &set_cookies).await;
            }
        }

        let status = response.status();
        if !status.is_success() {
            error!("upstream returned {} for {}", status, url);
            return Err(Error::UpstreamFetch(format!(
                "Upstream returned {}",
                status
            )));
        }

        Ok(response)
    }
}
