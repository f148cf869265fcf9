use crate::{
    AppState,
    auth::{self, CurrentUser},
    authz::{self, Access, MessageVisibility, Route},
    error::AppError,
    models::{LoginForm, MessageForm, NewMessage, ProfileForm, SignUpForm, User},
    validation::{
        self, LOGIN_CHECKS, MESSAGE_CHECKS, SIGN_UP_CHECKS, USERNAME_TAKEN, Validated,
        ValidationFailure,
    },
    views,
};
use axum::{
    Form, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

// --- Gate Helpers ---

/// A 302 Found redirect.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

// Applies the gate to a route that any visitor may reach when allowed.
fn check(user: Option<&User>, route: Route) -> Option<Response> {
    match authz::gate(user, route) {
        Access::Allow => None,
        Access::Redirect(to) => Some(redirect(to)),
    }
}

// Applies the gate to a route that needs an identity, handing that identity back.
fn admit(user: Option<User>, route: Route) -> Result<User, Response> {
    match (authz::gate(user.as_ref(), route), user) {
        (Access::Allow, Some(user)) => Ok(user),
        (Access::Redirect(to), _) => Err(redirect(to)),
        (Access::Allow, None) => Err(redirect("/")),
    }
}

// --- Public Handlers ---

/// index
///
/// [Public Route] Every message, with author and timestamp shown only to members.
pub async fn index(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let messages = state.repo.list_messages().await?;
    let visibility = MessageVisibility::for_viewer(user.as_ref());
    Ok(Html(views::index(user.as_ref(), &messages, visibility)).into_response())
}

/// sign_up_get
///
/// [Guest Route] Registration form. Signed-in users go back to the index.
pub async fn sign_up_get(CurrentUser(user): CurrentUser) -> Response {
    if let Some(denied) = check(user.as_ref(), Route::SignUp) {
        return denied;
    }
    Html(views::sign_up(None)).into_response()
}

/// sign_up_post
///
/// [Guest Route] Validates, hashes and persists a new user. With auto-login enabled the
/// new user gets a session straight away; otherwise they are sent to the login page.
pub async fn sign_up_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    if let Some(denied) = check(user.as_ref(), Route::SignUp) {
        return Ok(denied);
    }

    let form = match validation::validate(form, SIGN_UP_CHECKS, state.repo.as_ref()).await? {
        Validated::Valid(form) => form,
        Validated::Invalid(failure) => {
            return Ok(Html(views::sign_up(Some(&failure))).into_response());
        }
    };

    let retry = SignUpForm {
        password: String::new(),
        ..form.clone()
    };
    let user = match auth::register(state.repo.as_ref(), form).await {
        Ok(user) => user,
        Err(AppError::UsernameTaken) => {
            let failure = ValidationFailure::single(&retry, "username", USERNAME_TAKEN);
            return Ok(Html(views::sign_up(Some(&failure))).into_response());
        }
        Err(e) => return Err(e),
    };

    if !state.config.auto_login {
        return Ok(redirect("/login"));
    }

    let token = state.sessions.create(user.id).await?;
    Ok((jar.add(state.sessions.cookie(token)), redirect("/")).into_response())
}

/// login_get
pub async fn login_get(CurrentUser(user): CurrentUser) -> Response {
    if let Some(denied) = check(user.as_ref(), Route::Login) {
        return denied;
    }
    Html(views::login("", &[])).into_response()
}

/// login_post
///
/// [Guest Route] Runs the username/password strategy. Unknown users and wrong passwords
/// get the same message and the same status.
pub async fn login_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(denied) = check(user.as_ref(), Route::Login) {
        return Ok(denied);
    }

    let form = match validation::validate(form, LOGIN_CHECKS, state.repo.as_ref()).await? {
        Validated::Valid(form) => form,
        Validated::Invalid(failure) => {
            let page = views::login(failure.value("username"), &failure.messages());
            return Ok(Html(page).into_response());
        }
    };

    let user = match auth::authenticate(state.repo.as_ref(), &form.username, &form.password).await
    {
        Ok(user) => user,
        Err(AppError::Auth(reason)) => {
            tracing::info!(%reason, "login refused");
            let page = views::login(&form.username, &[reason.user_message()]);
            return Ok(Html(page).into_response());
        }
        Err(e) => return Err(e),
    };

    let token = state.sessions.create(user.id).await?;
    Ok((jar.add(state.sessions.cookie(token)), redirect("/")).into_response())
}

/// logout
///
/// Destroys the server-side session and clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(crate::session::SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await?;
    }
    Ok((jar.remove(state.sessions.removal_cookie()), redirect("/")).into_response())
}

/// health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// not_found
///
/// Fallback for every unrouted path.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

// --- Authenticated Handlers ---

/// profile_get
///
/// [Authenticated Route] Current flags plus the passphrase form.
pub async fn profile_get(CurrentUser(user): CurrentUser) -> Response {
    match admit(user, Route::Profile) {
        Ok(user) => Html(views::profile(&user, None)).into_response(),
        Err(denied) => denied,
    }
}

/// profile_post
///
/// [Authenticated Route] Passphrase elevation. Membership and admin are granted
/// independently and never revoked here.
pub async fn profile_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let user = match admit(user, Route::Profile) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };

    let elevation = authz::elevate(&form.membership_password, &form.admin_password, &state.config);

    if elevation.grants_anything() {
        if elevation.changes(&user) {
            state
                .repo
                .grant_flags(user.id, elevation.membership, elevation.admin)
                .await?;
            tracing::info!(
                user_id = %user.id,
                membership = elevation.membership,
                admin = elevation.admin,
                "user elevated"
            );
        }
        return Ok(redirect("/"));
    }

    let submitted_anything =
        !form.membership_password.trim().is_empty() || !form.admin_password.trim().is_empty();
    if submitted_anything {
        return Ok(Html(views::profile(&user, Some("Incorrect passphrase"))).into_response());
    }

    Ok(redirect("/"))
}

/// send_message_get
pub async fn send_message_get(CurrentUser(user): CurrentUser) -> Response {
    match admit(user, Route::SendMessage) {
        Ok(user) => Html(views::send_message(&user, None)).into_response(),
        Err(denied) => denied,
    }
}

/// send_message_post
///
/// [Authenticated Route] Validates and stores a message authored by the current user.
pub async fn send_message_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let user = match admit(user, Route::SendMessage) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };

    let form = match validation::validate(form, MESSAGE_CHECKS, state.repo.as_ref()).await? {
        Validated::Valid(form) => form,
        Validated::Invalid(failure) => {
            return Ok(Html(views::send_message(&user, Some(&failure))).into_response());
        }
    };

    let message = state
        .repo
        .create_message(NewMessage {
            title: form.title,
            text: form.text,
            author_id: user.id,
        })
        .await?;
    tracing::info!(message_id = %message.id, author_id = %user.id, "message created");

    Ok(redirect("/"))
}

// --- Admin Handlers ---

/// delete_get
///
/// [Admin Route] Confirmation page. Malformed ids and missing messages redirect to the
/// index without an error.
pub async fn delete_get(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = match admit(user, Route::Delete) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };

    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(redirect("/"));
    };

    match state.repo.get_message(id).await? {
        Some(message) => Ok(Html(views::delete_message(&user, &message)).into_response()),
        None => Ok(redirect("/")),
    }
}

/// delete_post
///
/// [Admin Route] Deletes the message, then returns to the index whether or not it
/// still existed.
pub async fn delete_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = match admit(user, Route::Delete) {
        Ok(user) => user,
        Err(denied) => return Ok(denied),
    };

    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(redirect("/"));
    };

    if state.repo.delete_message(id).await? {
        tracing::info!(message_id = %id, admin_id = %user.id, "message deleted");
    }
    Ok(redirect("/"))
}
