use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Pages for any signed-in user. Each handler resolves `CurrentUser` and redirects guests
/// to `/` before touching a store.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/POST /profile
        // Shows the user's flags. The POST compares the submitted passphrases with the
        // configured secrets and grants membership and/or admin.
        .route(
            "/profile",
            get(handlers::profile_get).post(handlers::profile_post),
        )
        // GET/POST /send-message
        // Compose and submit a message authored by the current user.
        .route(
            "/send-message",
            get(handlers::send_message_get).post(handlers::send_message_post),
        )
}
