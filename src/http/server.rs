//! HTTP server setup and composition root.
//!
//! # Responsibilities
//! - Build one circuit breaker and one client per backend
//! - Create the retry queue and run its dispatcher next to the server
//! - Create the Axum Router with all handlers and middleware
//!   (tracing, request timeout, CORS, request ID)
//! - Serve until the shutdown signal, then drain

use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::{BackendConfig, GatewayConfig, PaginationConfig};
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::orchestrator::Orchestrator;
use crate::resilience::{CallGate, RetryDispatcher, RetryScheduler};
use crate::upstream::{Backend, BackendClient, HyperTransport, Transport};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub pagination: PaginationConfig,
}

/// Errors raised while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid base URL '{url}' for backend '{name}': {source}")]
    BaseUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    orchestrator: Orchestrator,
    dispatcher: RetryDispatcher,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server that reaches backends over the network.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let transport = Arc::new(HyperTransport::new(config.timeouts.upstream()));
        Self::with_transport(config, transport)
    }

    /// Create a server that sends every outbound call through `transport`.
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> Result<Self, ServerError> {
        let client = |backend: Backend, backend_config: &BackendConfig| -> Result<BackendClient, ServerError> {
            let base_url = Url::parse(&backend_config.base_url).map_err(|source| ServerError::BaseUrl {
                name: backend_config.name.clone(),
                url: backend_config.base_url.clone(),
                source,
            })?;
            let gate = Arc::new(CallGate::new(&backend_config.name, config.circuit_breaker.clone()));
            Ok(BackendClient::new(
                backend,
                &backend_config.name,
                base_url,
                gate,
                transport.clone(),
                config.timeouts.upstream(),
            ))
        };

        let catalog = client(Backend::Catalog, &config.backends.catalog)?;
        let reputation = client(Backend::Reputation, &config.backends.reputation)?;
        let booking = client(Backend::Booking, &config.backends.booking)?;

        let (retries, dispatcher) = RetryScheduler::new(config.retry.interval());
        let orchestrator = Orchestrator::new(catalog, reputation, booking, retries);

        let state = AppState {
            orchestrator: orchestrator.clone(),
            pagination: config.pagination.clone(),
        };
        let router = Self::build_router(&config, state);

        Ok(Self {
            router,
            orchestrator,
            dispatcher,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/libraries", get(handlers::list_libraries))
            .route("/libraries/{library_uid}/books", get(handlers::list_books))
            .route("/rating", get(handlers::rating))
            .route("/reservations", get(handlers::reservations).post(handlers::take_book))
            .route("/reservations/{reservation_uid}/return", post(handlers::return_book));

        Router::new()
            .nest("/api/v1", api)
            .route("/manage/health", get(handlers::health))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(HandleErrorLayer::new(handlers::handle_middleware_error))
                    .timeout(Duration::from_secs(config.timeouts.request_secs))
                    .layer(CorsLayer::permissive()),
            )
    }

    /// The use cases behind the routes.
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// The retry dispatcher runs for the lifetime of the server; jobs still
    /// queued at shutdown are dropped.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            catalog = %self.config.backends.catalog.base_url,
            reputation = %self.config.backends.reputation.base_url,
            booking = %self.config.backends.booking.base_url,
            "HTTP server starting"
        );

        let dispatcher = tokio::spawn(self.dispatcher.run(shutdown.subscribe()));

        let mut server_shutdown = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        // serve() can also return on its own; make sure the dispatcher follows
        shutdown.trigger();
        if let Err(e) = dispatcher.await {
            tracing::error!(error = %e, "Retry dispatcher task failed");
        }

        tracing::info!(
            jobs_submitted = self.orchestrator.retries().submitted(),
            "HTTP server stopped"
        );
        Ok(())
    }
}
