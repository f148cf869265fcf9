use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::views;

/// AuthError
///
/// Why a login attempt was refused. Both variants render the same generic message so the
/// login page never reveals whether the username exists.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("unknown user")]
    UnknownUser,
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    pub const GENERIC_MESSAGE: &'static str = "Incorrect username or password";

    /// The text shown on the login form.
    pub fn user_message(&self) -> &'static str {
        Self::GENERIC_MESSAGE
    }
}

/// AppError
///
/// Every failure a handler can hand back to the error boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    // Raised by the store when the username UNIQUE constraint fires.
    #[error("username already taken")]
    UsernameTaken,

    #[error("page not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// ErrorReport
///
/// Attached to every error response so the error-page middleware can re-render the page
/// with the failure detail in development mode.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub detail: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AppError::NotFound => "Not Found",
            _ => "Something went wrong",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let report = ErrorReport {
            status,
            message: self.public_message().to_string(),
            detail: format!("{:?}", self),
        };

        let mut response = (status, Html(views::error_page(&report.message, status, None)))
            .into_response();
        response.extensions_mut().insert(report);
        response
    }
}
