use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};
use tokio::{sync::RwLock, task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{config::AppConfig, error::AppError};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "members_session";

/// How often the server sweeps expired sessions out of the store.
pub const SESSION_PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(15 * 60);

/// SessionClaims
///
/// Payload of the signed token stored in the cookie. It references the server-side record
/// and carries nothing about the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id (primary key of the `sessions` table).
    pub sid: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// SessionRecord
///
/// Durable server-side half of a session.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// SessionStore
///
/// Persistence contract for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: SessionRecord) -> Result<(), AppError>;
    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>, AppError>;
    async fn remove(&self, id: Uuid) -> Result<(), AppError>;
    // Deletes every expired record, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}

/// PostgresSessionStore
///
/// Keeps sessions in the `sessions` table so they survive restarts and redeploys.
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>, AppError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// MemorySessionStore
///
/// Volatile store for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), AppError> {
        self.records.write().await.insert(record.id, record);
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.records.write().await.remove(&id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired());
        Ok((before - records.len()) as u64)
    }
}

/// SessionManager
///
/// Binds a signed cookie token to a server-side session record.
/// - `create` persists a record and returns the token for the cookie.
/// - `resolve` verifies the token signature and returns the user id of a live session.
/// - `destroy` removes the record behind a token.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    secret: String,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: &AppConfig) -> Self {
        Self {
            store,
            secret: config.session_secret.clone(),
            ttl: Duration::hours(config.session_ttl_hours),
            secure_cookie: !config.is_development(),
        }
    }

    pub async fn create(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let claims = SessionClaims {
            sid: record.id,
            iat: now.timestamp() as usize,
            exp: record.expires_at.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Session(e.to_string()))?;

        self.store.insert(record).await?;
        tracing::debug!(%user_id, "session created");
        Ok(token)
    }

    /// resolve
    ///
    /// Forged, malformed or expired tokens resolve to `None`. Expired records are removed.
    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let Some(claims) = self.decode(token, true) else {
            return Ok(None);
        };

        match self.store.load(claims.sid).await? {
            Some(record) if record.is_expired() => {
                self.store.remove(record.id).await?;
                Ok(None)
            }
            Some(record) => Ok(Some(record.user_id)),
            None => Ok(None),
        }
    }

    pub async fn destroy(&self, token: &str) -> Result<(), AppError> {
        // An expired token still names a record worth deleting.
        if let Some(claims) = self.decode(token, false) {
            self.store.remove(claims.sid).await?;
            tracing::debug!(sid = %claims.sid, "session destroyed");
        }
        Ok(())
    }

    /// purge_expired
    ///
    /// Drops records whose browser never came back to trigger `resolve`.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "expired sessions purged");
        }
        Ok(purged)
    }

    /// spawn_purge_task
    ///
    /// Runs `purge_expired` every `period`, starting immediately. The task lives until the
    /// returned handle is aborted. Store failures are logged and retried on the next tick.
    pub fn spawn_purge_task(&self, period: std::time::Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = manager.purge_expired().await {
                    tracing::warn!(error = %e, "session purge failed");
                }
            }
        })
    }

    /// The cookie that carries `token` back to the browser.
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .build()
    }

    /// A cookie matching the session cookie's path, for `CookieJar::remove`.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }

    fn decode(&self, token: &str, check_exp: bool) -> Option<SessionClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = check_exp;
        if !check_exp {
            validation.required_spec_claims.clear();
        }
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .ok()
    }
}
