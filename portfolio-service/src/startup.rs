//! Application wiring: shared state, router, and server lifecycle.

use crate::config::PortfolioConfig;
use crate::handlers::{
    gemini_proxy, health_check, metrics_endpoint, portfolio_page, readiness_check, submit_contact,
};
use crate::services::{
    ContactNotifier, ContactStore, EmailProvider, GeminiClient, MockEmailProvider,
    PgContactStore, SmtpProvider, TextGenerator,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    allowed_hosts_middleware, metrics_middleware, request_id_middleware,
    security_headers_middleware, AllowedHosts,
};
use service_core::observability::REQUEST_ID_HEADER;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortfolioConfig>,
    pub store: Arc<dyn ContactStore>,
    pub notifier: ContactNotifier,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(
        config: PortfolioConfig,
        store: Arc<dyn ContactStore>,
        email_provider: Arc<dyn EmailProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let notifier = ContactNotifier::new(email_provider, config.smtp.recipient.clone());
        Self {
            config: Arc::new(config),
            store,
            notifier,
            generator,
        }
    }
}

/// Build the full router for the given state.
pub fn build_router(state: AppState) -> Router {
    let allowed_hosts = Arc::new(AllowedHosts::new(&state.config.site.allowed_hosts));
    let static_dir = ServeDir::new(&state.config.site.static_dir);

    Router::new()
        .route("/", get(portfolio_page).post(submit_contact))
        .route("/api/gemini-proxy/", any(gemini_proxy))
        .route("/api/gemini-proxy", any(gemini_proxy))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .nest_service("/static", static_dir)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn_with_state(allowed_hosts, allowed_hosts_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect collaborators and bind the listener.
    pub async fn build(config: PortfolioConfig) -> Result<Self, AppError> {
        let store = PgContactStore::connect(&config.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to PostgreSQL: {}", e);
                e
            })?;

        store.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;

        let email_provider: Arc<dyn EmailProvider> = if config.smtp.enabled {
            match SmtpProvider::new(config.smtp.clone()) {
                Ok(provider) => {
                    tracing::info!("SMTP email provider initialized");
                    Arc::new(provider)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP provider: {}. Using mock.", e);
                    Arc::new(MockEmailProvider::new())
                }
            }
        } else {
            tracing::info!("SMTP provider disabled, using mock email provider");
            Arc::new(MockEmailProvider::new())
        };

        let generator = GeminiClient::new(config.gemini.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}", e)))?;
        if !generator.is_configured() {
            tracing::warn!("GEMINI_API_KEY missing or placeholder; proxy will answer 503");
        }

        let state = AppState::new(config, Arc::new(store), email_provider, Arc::new(generator));

        Self::bind(state).await
    }

    /// Bind the listener for an already assembled state.
    ///
    /// Port 0 picks a random port, which tests rely on.
    pub async fn bind(state: AppState) -> Result<Self, AppError> {
        let address = state.config.common.bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Portfolio service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the listener fails or the future is dropped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
