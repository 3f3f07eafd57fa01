//! Redirect HTTP server
//!
//! Answers every request with either a redirect to its canonical URL or the
//! configured "no redirect" status. TLS is expected to be terminated in front
//! of this server; the client-facing scheme is taken from `X-Forwarded-Proto`
//! when trusted.

use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use canonhost_router::{DomainRegistry, RequestFacts};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ServerSettings;

/// Redirect server configuration
#[derive(Debug, Clone)]
pub struct RedirectServerConfig {
    pub bind_addr: SocketAddr,
    pub redirect_status: StatusCode,
    pub no_redirect_status: StatusCode,
    pub trust_forwarded_proto: bool,
}

impl RedirectServerConfig {
    /// Build server configuration from config file settings
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            redirect_status: settings.redirect_status()?,
            no_redirect_status: settings.no_redirect_status()?,
            trust_forwarded_proto: settings.trust_forwarded_proto,
        })
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub registry: Arc<DomainRegistry>,
    pub redirect_status: StatusCode,
    pub no_redirect_status: StatusCode,
    pub trust_forwarded_proto: bool,
}

/// Redirect server
pub struct RedirectServer {
    config: RedirectServerConfig,
    state: Arc<AppState>,
}

impl RedirectServer {
    /// Create a server over a fully built registry
    pub fn new(config: RedirectServerConfig, registry: Arc<DomainRegistry>) -> Self {
        let state = Arc::new(AppState {
            registry,
            redirect_status: config.redirect_status,
            no_redirect_status: config.no_redirect_status,
            trust_forwarded_proto: config.trust_forwarded_proto,
        });

        Self { config, state }
    }

    /// Build the axum router
    ///
    /// Every path and method goes through the redirect handler.
    pub fn build_router(&self) -> Router {
        Router::new()
            .fallback(redirect_handler)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the redirect server
    ///
    /// Returns after Ctrl-C or SIGTERM once in-flight requests are done.
    pub async fn start(self) -> Result<()> {
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        info!("Redirect server listening on {}", self.config.bind_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("Redirect server stopped");
        Ok(())
    }
}

/// Resolve the request against the registry and answer accordingly
async fn redirect_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let facts = match RequestFacts::from_request(&request, state.trust_forwarded_proto) {
        Ok(facts) => facts,
        Err(e) => {
            debug!("Rejecting request: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match facts.resolve(&state.registry) {
        Some(location) => {
            debug!(
                host = %facts.host,
                secure = facts.is_secure,
                %location,
                "Redirecting"
            );
            (state.redirect_status, [(header::LOCATION, location)]).into_response()
        }
        None => {
            debug!(host = %facts.host, "No redirect");
            (state.no_redirect_status, "No canonical redirect\n").into_response()
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received, draining connections");
}
