//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers. This is the unified
//! entry point for the surrounding application; every handler is a thin
//! adapter over the `BetaLab` core.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::capture_routes::capture_routes;
use super::consensus_routes::consensus_routes;
use super::curation_routes::curation_routes;
use super::rules_routes::rules_routes;
use super::scenario_routes::scenario_routes;
use crate::config::HttpConfig;
use crate::core::BetaLab;
use crate::observability::{Event, Logger};

/// HTTP server for the BetaLab core.
pub struct HttpServer {
    config: HttpConfig,
    router: Router,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    engine_version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        engine_version: crate::ENGINE_VERSION,
    })
}

impl HttpServer {
    /// Create a server over an assembled core.
    pub fn new(config: HttpConfig, lab: Arc<BetaLab>) -> Self {
        let router = Self::build_router(&config, lab);
        Self { config, router }
    }

    /// Build the combined router with all endpoints.
    fn build_router(config: &HttpConfig, lab: Arc<BetaLab>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            // Permissive for development
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(health))
            .merge(scenario_routes(lab.clone()))
            .merge(capture_routes(lab.clone()))
            .merge(curation_routes(lab.clone()))
            .merge(consensus_routes(lab.clone()))
            .merge(rules_routes(lab))
            .layer(cors)
    }

    /// Get the socket address string.
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing).
    pub fn router(self) -> Router {
        self.router
    }

    /// Start serving. Runs until the process exits.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Logger::info(
            Event::BootComplete.as_str(),
            &[("addr", &addr.to_string())],
        );

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BetaLabConfig;

    #[test]
    fn test_router_builds() {
        let lab = Arc::new(BetaLab::new(BetaLabConfig::default()));
        let server = HttpServer::new(HttpConfig::default(), lab);
        assert_eq!(server.socket_addr(), "127.0.0.1:7070");
        let _router = server.router();
    }
}
