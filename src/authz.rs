use crate::{config::AppConfig, models::User};

/// Route
///
/// The gated pages of the board. GET and POST of a page share one entry. The index and
/// logout are open to every visitor and never consult the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignUp,
    Login,
    Profile,
    SendMessage,
    Delete,
}

/// Access
///
/// Outcome of the gate. Denials are redirects, never errors, so an unauthorized visitor
/// learns nothing about whether the target exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

/// gate
///
/// Pure decision over the session identity and the requested route.
pub fn gate(user: Option<&User>, route: Route) -> Access {
    match (user, route) {
        (None, Route::Profile | Route::SendMessage | Route::Delete) => Access::Redirect("/"),
        (Some(user), Route::Delete) if !user.admin => Access::Redirect("/"),
        (Some(_), Route::SignUp | Route::Login) => Access::Redirect("/"),
        _ => Access::Allow,
    }
}

/// Elevation
///
/// Flags a profile submission grants. Each flag is decided independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elevation {
    pub membership: bool,
    pub admin: bool,
}

impl Elevation {
    pub fn grants_anything(&self) -> bool {
        self.membership || self.admin
    }

    /// True when applying this elevation would change `user`.
    pub fn changes(&self, user: &User) -> bool {
        (self.membership && !user.membership) || (self.admin && !user.admin)
    }
}

/// elevate
///
/// Compares the submitted passphrases against the configured secrets. An empty secret
/// never matches, so an unset passphrase cannot be claimed with an empty field.
pub fn elevate(membership_passphrase: &str, admin_passphrase: &str, config: &AppConfig) -> Elevation {
    Elevation {
        membership: passphrase_matches(membership_passphrase, &config.member_passphrase),
        admin: passphrase_matches(admin_passphrase, &config.admin_passphrase),
    }
}

fn passphrase_matches(submitted: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let submitted = submitted.trim().as_bytes();
    let secret = secret.as_bytes();
    // Work scales with the submitted length only; the secret is walked cyclically so its
    // length never shortens the loop.
    let mut diff = submitted.len() ^ secret.len();
    for (i, byte) in submitted.iter().enumerate() {
        diff |= usize::from(byte ^ secret[i % secret.len()]);
    }
    diff == 0
}

/// MessageVisibility
///
/// Which metadata the index shows for each message. The set of messages never depends on
/// the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageVisibility {
    pub show_author: bool,
    pub show_timestamp: bool,
    pub can_delete: bool,
}

impl MessageVisibility {
    pub fn for_viewer(user: Option<&User>) -> Self {
        match user {
            Some(user) if user.admin => Self {
                show_author: true,
                show_timestamp: true,
                can_delete: true,
            },
            Some(user) if user.membership => Self {
                show_author: true,
                show_timestamp: true,
                can_delete: false,
            },
            _ => Self::default(),
        }
    }
}
