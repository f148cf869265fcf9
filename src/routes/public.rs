use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. The index shows the same message set to
/// everyone; only the metadata differs. Sign-up and login bounce visitors who already
/// hold a session back to the index.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(handlers::health))
        // GET /
        // All messages, oldest first.
        .route("/", get(handlers::index))
        // GET/POST /sign-up
        // Registration form and submission. Runs the full validation pipeline, including
        // the username existence check.
        .route(
            "/sign-up",
            get(handlers::sign_up_get).post(handlers::sign_up_post),
        )
        // GET/POST /login
        // Credential submission through the username/password strategy.
        .route("/login", get(handlers::login_get).post(handlers::login_post))
        // GET /logout
        // Destroys the server-side session and clears the cookie.
        .route("/logout", get(handlers::logout))
}
