use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Message moderation. Guests and non-admin users are redirected to `/` and the target
/// message is left untouched; a missing message also redirects, so the response never
/// reveals whether an id exists.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /delete/{id}
        // Confirmation page and the deletion itself.
        .route(
            "/delete/{id}",
            get(handlers::delete_get).post(handlers::delete_post),
        )
}
