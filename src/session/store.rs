use super::types::StoredState;
use crate::error::StorageError;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Async session persistence contract: one state blob per key, last writer
/// wins.
pub trait SessionStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StoredState>>;

    fn put<'a>(&'a self, key: &'a str, state: &'a StoredState) -> StoreFuture<'a, ()>;
}

/// SQLite-backed session store using sqlx async pool.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

const SESSION_SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS session_schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const SESSION_SCHEMA_VERSION_KEY: &str = "session_schema_version";
const SESSION_SCHEMA_VERSION: u32 = 1;

async fn ensure_session_schema_version(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query(SESSION_SCHEMA_META_TABLE).execute(pool).await?;

    let stored_version: Option<(String,)> =
        sqlx::query_as("SELECT value FROM session_schema_meta WHERE key = $1")
            .bind(SESSION_SCHEMA_VERSION_KEY)
            .fetch_optional(pool)
            .await?;

    if let Some((value,)) = stored_version {
        let parsed = value.parse::<u32>().map_err(|_| {
            StorageError::Migration(format!("invalid session schema version value: {value}"))
        })?;
        if parsed != SESSION_SCHEMA_VERSION {
            return Err(StorageError::Migration(format!(
                "incompatible session schema version: stored={parsed}, \
expected={SESSION_SCHEMA_VERSION}; remove the session DB and restart"
            )));
        }
        return Ok(());
    }

    sqlx::query("INSERT INTO session_schema_meta (key, value) VALUES ($1, $2)")
        .bind(SESSION_SCHEMA_VERSION_KEY)
        .bind(SESSION_SCHEMA_VERSION.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

impl SqliteSessionStore {
    /// Create a new store with an existing pool and run migrations.
    pub async fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        ensure_session_schema_version(&pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session_states (
                 session_key TEXT PRIMARY KEY,
                 state       TEXT NOT NULL,
                 updated_at  TEXT NOT NULL
             )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Open (creating if needed) a database file and run migrations.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Query(format!("create {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), "session database opened");
        Self::new(pool).await
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SessionStore for SqliteSessionStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StoredState>> {
        Box::pin(async move {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT state FROM session_states WHERE session_key = $1")
                    .bind(key)
                    .fetch_optional(&self.pool)
                    .await?;

            row.map(|(raw,)| serde_json::from_str::<StoredState>(&raw))
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn put<'a>(&'a self, key: &'a str, state: &'a StoredState) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let raw = serde_json::to_string(state)?;
            sqlx::query(
                "INSERT INTO session_states (session_key, state, updated_at)
                 VALUES ($1, $2, $3)
                 ON CONFLICT(session_key) DO UPDATE
                 SET state = excluded.state, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(raw)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }
}

/// Process-local store; state is lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    states: Mutex<HashMap<String, StoredState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredState>> {
        self.states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StoredState>> {
        let state = self.lock().get(key).cloned();
        Box::pin(async move { Ok(state) })
    }

    fn put<'a>(&'a self, key: &'a str, state: &'a StoredState) -> StoreFuture<'a, ()> {
        self.lock().insert(key.to_string(), state.clone());
        Box::pin(async move { Ok(()) })
    }
}
