use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::server::services::{cookie_services::CookieService, upstream_services::UpstreamService};

use super::{cookie_services::DynCookieService, upstream_services::DynUpstreamService};

/// everything the request handlers share, built once at startup
/// no database and no redis - the cookie jar is plain process memory
#[derive(Clone)]
pub struct ProxyServices {
    pub cookies: DynCookieService,
    pub upstream: DynUpstreamService,
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
}

impl ProxyServices {
    pub fn new(config: Arc<AppConfig>) -> Self {
        info!("starting proxy services (in-memory cookie jar)...");

        // one client for the whole process, reqwest follows redirects by default
        let http = reqwest::Client::new();

        let cookies = Arc::new(CookieService::new()) as DynCookieService;

        let upstream = Arc::new(UpstreamService::new(
            http.clone(),
            cookies.clone(),
            config.upstream_timeout_secs,
        )) as DynUpstreamService;

        Self {
            cookies,
            upstream,
            http,
            config,
        }
    }
}
