use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
};

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core: authentication, authorization and validation.
pub mod auth;
pub mod authz;
pub mod validation;

// Supporting services and components.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod session;
pub mod views;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AuthError};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use session::{MemorySessionStore, PostgresSessionStore, SessionManager};

/// AppState
///
/// The explicitly constructed application context: built once in `main` (or a test) and
/// cloned into every handler. There is no other shared state.
#[derive(Clone)]
pub struct AppState {
    /// Credential and Content Store.
    pub repo: RepositoryState,
    /// Signed-cookie sessions backed by a durable store.
    pub sessions: SessionManager,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        repo: RepositoryState,
        session_store: std::sync::Arc<dyn session::SessionStore>,
        config: AppConfig,
    ) -> Self {
        let sessions = SessionManager::new(session_store, &config);
        Self {
            repo,
            sessions,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(app_state: &AppState) -> SessionManager {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// error_detail_middleware
///
/// In development mode, re-renders error pages with the failure detail attached by
/// `AppError`. In production the generic page passes through untouched.
async fn error_detail_middleware(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !config.is_development() {
        return response;
    }

    match response.extensions().get::<error::ErrorReport>().cloned() {
        Some(report) => (
            report.status,
            Html(views::error_page(
                &report.message,
                report.status,
                Some(&report.detail),
            )),
        )
            .into_response(),
        None => response,
    }
}

/// create_router
///
/// Assembles every route, the static stylesheet, the 404 fallback and the observability
/// layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .nest_service("/public", ServeDir::new("public"))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            error_detail_middleware,
        ))
        .with_state(state);

    base_router.layer(
        ServiceBuilder::new()
            // Generates a unique UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // Wraps the request/response lifecycle in a span carrying the request id.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // Returns the x-request-id header to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of a request shares its `req_id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
