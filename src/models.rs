use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Core Records (Mapped to Database) ---

/// User
///
/// Identity record stored in the `users` table. `password_hash` is an Argon2 PHC string;
/// the plaintext password never reaches this struct.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    // Unique, enforced by the `users_username_key` constraint.
    pub username: String,
    pub password_hash: String,
    pub membership: bool,
    pub admin: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Message
///
/// Content record from the `messages` table. Immutable once created.
#[derive(Debug, Clone, FromRow, Default)]
pub struct Message {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    // FK to users.id. Non-owning reference.
    pub author_id: Uuid,
}

/// MessageListing
///
/// A message joined with its author, as rendered on the index and delete pages.
#[derive(Debug, Clone, FromRow, Default)]
pub struct MessageListing {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_username: String,
}

impl MessageListing {
    pub fn author_name(&self) -> String {
        format!("{} {}", self.author_first_name, self.author_last_name)
    }

    /// Human readable creation time, e.g. "Mar 4, 2025, 09:15".
    pub fn timestamp_formatted(&self) -> String {
        self.created_at.format("%b %-d, %Y, %H:%M").to_string()
    }
}

// --- Insert Payloads ---

/// NewUser
///
/// A sanitized sign-up ready for persistence. `password_hash` has already been through
/// the hasher.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password_hash: String,
}

/// NewMessage
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
}

// --- Form Payloads (Input Schemas) ---

/// SignUpForm
///
/// Raw `application/x-www-form-urlencoded` body of POST /sign-up.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SignUpForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// LoginForm
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// ProfileForm
///
/// Both passphrases are optional; each is checked independently.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProfileForm {
    #[serde(default, rename = "membershipPassword")]
    pub membership_password: String,
    #[serde(default, rename = "adminPassword")]
    pub admin_password: String,
}

/// MessageForm
///
/// Body of POST /send-message.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MessageForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}
