use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{Extension, Router, http::HeaderValue, routing::get};
use once_cell::sync::Lazy;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;

pub mod api;
pub mod dtos;
pub mod error;
pub mod services;
pub mod utils;

use api::{cam_controller::CamController, health_controller, proxy_controller::ProxyController};
use services::proxy_services::ProxyServices;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct ProxyApplicationServer;

impl ProxyApplicationServer {
    pub async fn serve(config: Arc<AppConfig>) -> anyhow::Result<()> {
        // pin the uptime clock to process start, not first health check
        Lazy::force(&START_TIME);

        let port = config.port;
        let cors = Self::cors_layer(&config.cors_origin)?;

        let services = ProxyServices::new(config);

        let router = Router::new()
            .nest("/proxy", ProxyController::app())
            .nest("/api/cam", CamController::app())
            .route("/api/health", get(health_controller::health_endpoint))
            .layer(Extension(services))
            .layer(cors)
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .context("failed to bind listener")?;

        info!("proxy listening on 0.0.0.0:{}", port);

        axum::serve(listener, router)
            .await
            .context("server stopped unexpectedly")?;

        Ok(())
    }

    // the browser player is usually served from a different origin than this proxy
    fn cors_layer(cors_origin: &str) -> anyhow::Result<CorsLayer> {
        let layer = if cors_origin == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins = cors_origin
                .split(',')
                .map(|origin| {
                    origin
                        .trim()
                        .parse::<HeaderValue>()
                        .with_context(|| format!("invalid cors origin: {}", origin))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Ok(layer)
    }
}
