//! Server-rendered HTML pages.
//!
//! Every user-supplied string reaching these functions has already been escaped by the
//! validation pipeline on its way into the store, so stored fields are interpolated as-is.
//! Anything else that did not pass through the pipeline is escaped here.

use axum::http::StatusCode;
use std::fmt::Write;

use crate::{
    authz::MessageVisibility,
    models::{MessageListing, User},
    validation::{ValidationFailure, escape_html},
};

const SITE_TITLE: &str = "Members Only";

fn layout(title: &str, user: Option<&User>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<a href="/">Home</a> <a href="/send-message">New message</a> <a href="/profile">{}</a> <a href="/logout">Log out</a>"#,
            user.username
        ),
        None => r#"<a href="/">Home</a> <a href="/sign-up">Sign up</a> <a href="/login">Log in</a>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
<link rel="stylesheet" href="/public/style.css">
</head>
<body>
<header><h1>{site}</h1><nav>{nav}</nav></header>
<main>
{body}
</main>
</body>
</html>"#,
        title = title,
        site = SITE_TITLE,
        nav = nav,
        body = body,
    )
}

fn error_list(messages: &[&str]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<ul class="errors">"#);
    for message in messages {
        let _ = write!(out, "<li>{}</li>", escape_html(message));
    }
    out.push_str("</ul>");
    out
}

/// index
///
/// The full message list. `visibility` decides which metadata accompanies each message.
pub fn index(user: Option<&User>, messages: &[MessageListing], visibility: MessageVisibility) -> String {
    let mut body = String::new();

    match user {
        Some(user) if !user.membership && !user.admin => body.push_str(
            r#"<p class="hint">Join the club from your <a href="/profile">profile</a> to see who wrote what.</p>"#,
        ),
        None => body.push_str(
            r#"<p class="hint"><a href="/login">Log in</a> to post messages.</p>"#,
        ),
        _ => {}
    }

    if messages.is_empty() {
        body.push_str(r#"<p class="empty">No messages yet.</p>"#);
    }

    body.push_str(r#"<section class="messages">"#);
    for message in messages {
        let _ = write!(
            body,
            r#"<article class="message"><h2>{}</h2><p>{}</p>"#,
            message.title, message.text
        );
        if visibility.show_author || visibility.show_timestamp {
            body.push_str(r#"<footer>"#);
            if visibility.show_author {
                let _ = write!(
                    body,
                    r#"<span class="author" data-author-id="{}">{} (@{})</span>"#,
                    message.author_id,
                    message.author_name(),
                    message.author_username
                );
            }
            if visibility.show_timestamp {
                let _ = write!(
                    body,
                    r#" <time datetime="{}">{}</time>"#,
                    message.created_at.to_rfc3339(),
                    message.timestamp_formatted()
                );
            }
            if visibility.can_delete {
                let _ = write!(body, r#" <a class="delete" href="/delete/{}">Delete</a>"#, message.id);
            }
            body.push_str("</footer>");
        }
        body.push_str("</article>");
    }
    body.push_str("</section>");

    layout("Home", user, &body)
}

/// sign_up
///
/// Registration form, pre-filled from a failed submission when present.
pub fn sign_up(failure: Option<&ValidationFailure>) -> String {
    let value = |name: &str| failure.map(|f| f.value(name)).unwrap_or("").to_string();
    let errors = failure.map(|f| f.messages()).unwrap_or_default();

    let body = format!(
        r#"<h2>Sign up</h2>
{errors}
<form method="POST" action="/sign-up">
<label>First name <input name="first_name" value="{first}" maxlength="30" required></label>
<label>Last name <input name="last_name" value="{last}" maxlength="30" required></label>
<label>Username <input name="username" value="{username}" maxlength="30" required></label>
<label>Password <input type="password" name="password" minlength="10" required></label>
<button type="submit">Sign up</button>
</form>"#,
        errors = error_list(&errors),
        first = value("first_name"),
        last = value("last_name"),
        username = value("username"),
    );

    layout("Sign up", None, &body)
}

/// login
pub fn login(username: &str, errors: &[&str]) -> String {
    let body = format!(
        r#"<h2>Log in</h2>
{errors}
<form method="POST" action="/login">
<label>Username <input name="username" value="{username}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/sign-up">Sign up</a>.</p>"#,
        errors = error_list(errors),
        username = username,
    );

    layout("Log in", None, &body)
}

/// profile
///
/// Shows the current flags and the passphrase form.
pub fn profile(user: &User, error: Option<&str>) -> String {
    let status = match (user.membership, user.admin) {
        (_, true) => "Admin",
        (true, false) => "Member",
        (false, false) => "Not a member",
    };
    let errors: Vec<&str> = error.into_iter().collect();

    let mut body = format!(
        r#"<h2>{name}</h2>
<dl>
<dt>Username</dt><dd>{username}</dd>
<dt>Status</dt><dd class="status">{status}</dd>
</dl>
{errors}
<form method="POST" action="/profile">"#,
        name = user.full_name(),
        username = user.username,
        status = status,
        errors = error_list(&errors),
    );
    if !user.membership {
        body.push_str(
            r#"<label>Membership passphrase <input type="password" name="membershipPassword"></label>"#,
        );
    }
    if !user.admin {
        body.push_str(r#"<label>Admin passphrase <input type="password" name="adminPassword"></label>"#);
    }
    body.push_str(r#"<button type="submit">Submit</button></form>"#);

    layout("Profile", Some(user), &body)
}

/// send_message
pub fn send_message(user: &User, failure: Option<&ValidationFailure>) -> String {
    let value = |name: &str| failure.map(|f| f.value(name)).unwrap_or("").to_string();
    let errors = failure.map(|f| f.messages()).unwrap_or_default();

    let body = format!(
        r#"<h2>New message</h2>
{errors}
<form method="POST" action="/send-message">
<label>Title <input name="title" value="{title}" maxlength="30" required></label>
<label>Message <textarea name="text" maxlength="300" required>{text}</textarea></label>
<button type="submit">Send</button>
</form>"#,
        errors = error_list(&errors),
        title = value("title"),
        text = value("text"),
    );

    layout("New message", Some(user), &body)
}

/// delete_message
///
/// Confirmation page for an admin deleting a message.
pub fn delete_message(user: &User, message: &MessageListing) -> String {
    let body = format!(
        r#"<h2>Delete message</h2>
<article class="message"><h3>{title}</h3><p>{text}</p>
<footer><span class="author">{author}</span> <time>{timestamp}</time></footer></article>
<form method="POST" action="/delete/{id}">
<p>Delete this message permanently?</p>
<button type="submit">Delete</button> <a href="/">Cancel</a>
</form>"#,
        title = message.title,
        text = message.text,
        author = message.author_name(),
        timestamp = message.timestamp_formatted(),
        id = message.id,
    );

    layout("Delete message", Some(user), &body)
}

/// error_page
///
/// Generic error page. `detail` is only passed in development mode.
pub fn error_page(message: &str, status: StatusCode, detail: Option<&str>) -> String {
    let mut body = format!(
        r#"<h2>{}</h2><p class="status-code">{}</p>"#,
        escape_html(message),
        status.as_u16()
    );
    if let Some(detail) = detail {
        let _ = write!(body, r#"<pre class="detail">{}</pre>"#, escape_html(detail));
    }
    body.push_str(r#"<p><a href="/">Back to the board</a></p>"#);

    layout("Error", None, &body)
}
