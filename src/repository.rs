use crate::{
    error::AppError,
    models::{Message, MessageListing, NewMessage, NewUser, User},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract for the Credential Store (users) and the Content Store
/// (messages). Handlers only ever see `Arc<dyn Repository>`, so the Postgres
/// implementation and the in-memory one are interchangeable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    // Fails with `AppError::UsernameTaken` if the username already exists.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    // Monotonic: a `false` argument never clears a flag.
    async fn grant_flags(&self, id: Uuid, membership: bool, admin: bool)
    -> Result<Option<User>, AppError>;

    // --- Content Store ---
    // Every message with its author, oldest first.
    async fn list_messages(&self) -> Result<Vec<MessageListing>, AppError>;
    async fn get_message(&self, id: Uuid) -> Result<Option<MessageListing>, AppError>;
    async fn create_message(&self, message: NewMessage) -> Result<Message, AppError>;
    // Returns true only if a row was removed.
    async fn delete_message(&self, id: Uuid) -> Result<bool, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str =
    "id, first_name, last_name, username, password_hash, membership, admin";

const LISTING_SELECT: &str = r#"
    SELECT
        m.id, m.title, m.text, m.created_at, m.author_id,
        u.first_name AS author_first_name,
        u.last_name AS author_last_name,
        u.username AS author_username
    FROM messages m
    JOIN users u ON m.author_id = u.id
"#;

/// PostgresRepository
///
/// The production implementation, backed by the `users` and `messages` tables.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// New users always start with both flags false. The `users_username_key` UNIQUE
    /// constraint closes the window between the validator's existence check and this
    /// insert; a violation comes back as `UsernameTaken`.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (id, first_name, last_name, username, password_hash, membership, admin) \
             VALUES ($1, $2, $3, $4, $5, false, false) RETURNING {}",
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::warn!(username = %user.username, "concurrent sign-up lost the username race");
                Err(AppError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn grant_flags(
        &self,
        id: Uuid,
        membership: bool,
        admin: bool,
    ) -> Result<Option<User>, AppError> {
        let query = format!(
            "UPDATE users SET membership = membership OR $2, admin = admin OR $3 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(membership)
            .bind(admin)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_messages(&self) -> Result<Vec<MessageListing>, AppError> {
        let query = format!("{} ORDER BY m.created_at ASC", LISTING_SELECT);
        let messages = sqlx::query_as::<_, MessageListing>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<MessageListing>, AppError> {
        let query = format!("{} WHERE m.id = $1", LISTING_SELECT);
        let message = sqlx::query_as::<_, MessageListing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    /// create_message
    ///
    /// The `author_id` foreign key rejects messages whose author does not exist.
    async fn create_message(&self, message: NewMessage) -> Result<Message, AppError> {
        let created = sqlx::query_as::<_, Message>(
            r#"INSERT INTO messages (id, title, text, created_at, author_id)
               VALUES ($1, $2, $3, NOW(), $4)
               RETURNING id, title, text, created_at, author_id"#,
        )
        .bind(Uuid::new_v4())
        .bind(&message.title)
        .bind(&message.text)
        .bind(message.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// MemoryRepository
///
/// An in-process implementation used by the test suite and for running the board without
/// a database. Mirrors the Postgres constraints: unique usernames and existing authors.
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<Vec<User>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    fn listing(message: &Message, author: &User) -> MessageListing {
        MessageListing {
            id: message.id,
            title: message.title.clone(),
            text: message.text.clone(),
            created_at: message.created_at,
            author_id: message.author_id,
            author_first_name: author.first_name.clone(),
            author_last_name: author.last_name.clone(),
            author_username: author.username.clone(),
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        // Check and insert under one write lock, like the UNIQUE constraint.
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(AppError::UsernameTaken);
        }
        let created = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            password_hash: user.password_hash,
            membership: false,
            admin: false,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn grant_flags(
        &self,
        id: Uuid,
        membership: bool,
        admin: bool,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.membership |= membership;
            user.admin |= admin;
            user.clone()
        }))
    }

    async fn list_messages(&self) -> Result<Vec<MessageListing>, AppError> {
        let users = self.users.read().await;
        let messages = self.messages.read().await;
        let mut listings: Vec<MessageListing> = messages
            .iter()
            .filter_map(|m| {
                users
                    .iter()
                    .find(|u| u.id == m.author_id)
                    .map(|author| Self::listing(m, author))
            })
            .collect();
        listings.sort_by_key(|m| m.created_at);
        Ok(listings)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<MessageListing>, AppError> {
        let users = self.users.read().await;
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).and_then(|m| {
            users
                .iter()
                .find(|u| u.id == m.author_id)
                .map(|author| Self::listing(m, author))
        }))
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, AppError> {
        if self.get_user(message.author_id).await?.is_none() {
            return Err(AppError::Internal(format!(
                "message author {} does not exist",
                message.author_id
            )));
        }
        let created = Message {
            id: Uuid::new_v4(),
            title: message.title,
            text: message.text,
            created_at: Utc::now(),
            author_id: message.author_id,
        };
        self.messages.write().await.push(created.clone());
        Ok(created)
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool, AppError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() < before)
    }
}
