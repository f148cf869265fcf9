use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::{AppError, AuthError},
    models::{NewUser, SignUpForm, User},
    password,
    repository::{Repository, RepositoryState},
    session::{SESSION_COOKIE, SessionManager},
};

/// authenticate
///
/// The username/password strategy: exact username lookup, then a hash comparison against
/// the stored Argon2 hash. Store and hashing failures come back as non-`Auth` errors.
///
/// An unknown username still pays for one verification, so response time does not tell
/// the two refusals apart.
pub async fn authenticate(
    repo: &dyn Repository,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let Some(user) = repo.find_user_by_username(username).await? else {
        // Outcome ignored: the refusal is the same whatever the dummy check says.
        let _ = password::verify_dummy(password.to_string()).await;
        return Err(AuthError::UnknownUser.into());
    };

    let matches =
        password::verify_password(password.to_string(), user.password_hash.clone()).await?;
    if !matches {
        return Err(AuthError::InvalidCredentials.into());
    }

    tracing::info!(user_id = %user.id, "user authenticated");
    Ok(user)
}

/// register
///
/// Persists a validated sign-up. The plaintext password is hashed before it reaches the
/// store. Fails with `UsernameTaken` if another sign-up claimed the name first.
pub async fn register(repo: &dyn Repository, form: SignUpForm) -> Result<User, AppError> {
    let password_hash = password::hash_password(form.password).await?;

    let user = repo
        .create_user(NewUser {
            first_name: form.first_name,
            last_name: form.last_name,
            username: form.username,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// CurrentUser
///
/// The identity of the request, resolved from the session cookie. `None` for guests and
/// for cookies whose session has expired, been destroyed, or names a missing user.
///
/// Resolution never rejects a request for lack of identity; only store failures reject.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionManager: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(CurrentUser(None));
        };

        let sessions = SessionManager::from_ref(state);
        let Some(user_id) = sessions.resolve(&token).await? else {
            return Ok(CurrentUser(None));
        };

        let repo = RepositoryState::from_ref(state);
        Ok(CurrentUser(repo.get_user(user_id).await?))
    }
}
