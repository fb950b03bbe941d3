//! Dirauth HTTP server

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post},
    Router,
};
use dirauth_core::{config::DirAuthConfig, Result};
use dirauth_ldap::{
    Authenticator, DomainDiscovery, HickorySrvResolver, Ldap3Connector, RetryPolicy,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, warn};

use crate::metrics::{metrics_handler, metrics_middleware, MetricsRecorder};
use crate::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub start_time: Instant,
    pub metrics: Arc<MetricsRecorder>,
}

impl AppState {
    pub fn new(authenticator: Arc<Authenticator>, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            authenticator,
            start_time: Instant::now(),
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<MetricsRecorder> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Dirauth server
pub struct DirAuthServer {
    config: DirAuthConfig,
}

impl DirAuthServer {
    pub fn new(config: DirAuthConfig) -> Self {
        Self { config }
    }

    /// Build the authenticator from configuration
    pub fn build_authenticator(config: &DirAuthConfig) -> Authenticator {
        let resolver = Arc::new(HickorySrvResolver::from_system_conf());
        let discovery = DomainDiscovery::from_settings(resolver, &config.discovery);
        let connector = Arc::new(Ldap3Connector::from_settings(&config.ldap));

        Authenticator::new(discovery, connector, config.ldap.clone())
            .with_retry_policy(RetryPolicy::from(&config.retry))
    }

    pub async fn run(self) -> Result<()> {
        self.config.validate()?;

        let metrics = Arc::new(MetricsRecorder::new());
        info!("Prometheus metrics initialized");

        let authenticator = Arc::new(Self::build_authenticator(&self.config));
        info!(
            base_dn = %self.config.ldap.base_dn,
            filter = %self.config.ldap.user_search_filter,
            "Directory authenticator initialized"
        );

        let state = AppState::new(authenticator, metrics);
        let app = create_router(state);

        let addr = format!("{}:{}", self.config.server.bind_address, self.config.server.port);
        let listener = TcpListener::bind(&addr).await?;

        info!("Dirauth listening on http://{}", addr);
        info!("Introspection endpoint at http://{}/api/v1/introspect", addr);
        info!("Prometheus metrics at http://{}/metrics", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Dirauth stopped");
        Ok(())
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/introspect", post(routes::introspect))
        .route("/api/v1/health", get(routes::health_check))
        .route("/api/v1/discovery/{domain}", get(routes::discover_domain))
        .route("/api/v1/discovery/cache", delete(routes::invalidate_all))
        .route("/api/v1/discovery/cache/{domain}", delete(routes::invalidate_domain))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
