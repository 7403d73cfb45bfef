use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use dashmap::DashMap;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, Row, SqlitePool};
use tracing::{info, warn};

/// Default SQLite file when no Postgres is reachable.
const SQLITE_PATH: &str = "tmp/portfolio_memory.db";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
    pub created_at: i64,
}

/// Session conversation memory.
///
/// Backend is chosen once at startup: Postgres when DATABASE_URL connects,
/// else file-backed SQLite, else a process-local map with no persistence.
pub enum SessionStore {
    Postgres(PgPool),
    Sqlite(SqlitePool),
    Memory(DashMap<String, Vec<StoredMessage>>),
}

impl SessionStore {
    /// Connect with the fallback ladder. Never fails: the worst case is
    /// the in-memory backend with a warning.
    pub async fn connect(database_url: Option<&str>) -> Self {
        if let Some(url) = database_url.filter(|u| !u.is_empty()) {
            match Self::connect_postgres(url).await {
                Ok(store) => {
                    info!("PostgreSQL connection succeeded, using PostgreSQL for session memory");
                    return store;
                }
                Err(e) => {
                    warn!("PostgreSQL connection failed: {}", e);
                    warn!("Falling back to SQLite for session memory");
                }
            }
        } else {
            info!("No DATABASE_URL configured, using SQLite for session memory");
        }

        match Self::connect_sqlite(SQLITE_PATH).await {
            Ok(store) => store,
            Err(e) => {
                warn!("SQLite setup failed ({}), falling back to non-persistent memory", e);
                SessionStore::Memory(DashMap::new())
            }
        }
    }

    async fn connect_postgres(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session_messages (
                id BIGSERIAL PRIMARY KEY,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at BIGINT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_session_messages_session
             ON session_messages (session_id, id)",
        )
        .execute(&pool)
        .await?;

        Ok(SessionStore::Postgres(pool))
    }

    async fn connect_sqlite(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(SessionStore::Sqlite(pool))
    }

    /// Append one turn to a session.
    pub async fn append(&self, session_id: &str, role: &str, content: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        match self {
            SessionStore::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO session_messages (session_id, role, content, created_at)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(session_id)
                .bind(role)
                .bind(content)
                .bind(now)
                .execute(pool)
                .await?;
            }
            SessionStore::Sqlite(pool) => {
                sqlx::query(
                    "INSERT INTO session_messages (session_id, role, content, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(session_id)
                .bind(role)
                .bind(content)
                .bind(now)
                .execute(pool)
                .await?;
            }
            SessionStore::Memory(map) => {
                map.entry(session_id.to_string()).or_default().push(StoredMessage {
                    role: role.to_string(),
                    content: content.to_string(),
                    created_at: now,
                });
            }
        }

        Ok(())
    }

    /// Last `limit` messages of a session, oldest first.
    pub async fn history(&self, session_id: &str, limit: u32) -> Result<Vec<StoredMessage>> {
        match self {
            SessionStore::Postgres(pool) => {
                let rows = sqlx::query(
                    "SELECT role, content, created_at FROM (
                        SELECT id, role, content, created_at FROM session_messages
                        WHERE session_id = $1 ORDER BY id DESC LIMIT $2
                     ) recent ORDER BY id ASC",
                )
                .bind(session_id)
                .bind(limit as i64)
                .fetch_all(pool)
                .await?;

                Ok(rows
                    .into_iter()
                    .map(|row| StoredMessage {
                        role: row.get("role"),
                        content: row.get("content"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
            SessionStore::Sqlite(pool) => {
                let rows = sqlx::query(
                    "SELECT role, content, created_at FROM (
                        SELECT id, role, content, created_at FROM session_messages
                        WHERE session_id = ?1 ORDER BY id DESC LIMIT ?2
                     ) ORDER BY id ASC",
                )
                .bind(session_id)
                .bind(limit as i64)
                .fetch_all(pool)
                .await?;

                Ok(rows
                    .into_iter()
                    .map(|row| StoredMessage {
                        role: row.get("role"),
                        content: row.get("content"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
            SessionStore::Memory(map) => {
                let messages = map
                    .get(session_id)
                    .map(|entry| {
                        let msgs = entry.value();
                        let start = msgs.len().saturating_sub(limit as usize);
                        msgs[start..].to_vec()
                    })
                    .unwrap_or_default();
                Ok(messages)
            }
        }
    }

    /// Whether a session has any stored messages.
    pub async fn has_messages(&self, session_id: &str) -> bool {
        match self {
            SessionStore::Postgres(pool) => sqlx::query(
                "SELECT 1 FROM session_messages WHERE session_id = $1 LIMIT 1",
            )
            .bind(session_id)
            .fetch_optional(pool)
            .await
            .map(|row| row.is_some())
            .unwrap_or(false),
            SessionStore::Sqlite(pool) => sqlx::query(
                "SELECT 1 FROM session_messages WHERE session_id = ?1 LIMIT 1",
            )
            .bind(session_id)
            .fetch_optional(pool)
            .await
            .map(|row| row.is_some())
            .unwrap_or(false),
            SessionStore::Memory(map) => {
                map.get(session_id).map(|e| !e.value().is_empty()).unwrap_or(false)
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            SessionStore::Postgres(_) => "postgres",
            SessionStore::Sqlite(_) => "sqlite",
            SessionStore::Memory(_) => "memory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let store = SessionStore::Memory(DashMap::new());

        assert!(!store.has_messages("s1").await);
        store.append("s1", "user", "bonjour").await.unwrap();
        store.append("s1", "assistant", "bonjour à vous").await.unwrap();
        assert!(store.has_messages("s1").await);
        assert!(!store.has_messages("s2").await);

        let history = store.history("s1", 5).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].content, "bonjour à vous");
    }

    #[tokio::test]
    async fn test_memory_backend_history_limit() {
        let store = SessionStore::Memory(DashMap::new());
        for i in 0..8 {
            store.append("s1", "user", &format!("m{}", i)).await.unwrap();
        }
        let history = store.history("s1", 5).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].content, "m3");
        assert_eq!(history[4].content, "m7");
    }

    #[tokio::test]
    async fn test_sqlite_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        let store = SessionStore::connect_sqlite(path.to_str().unwrap())
            .await
            .unwrap();

        store.append("s1", "user", "premier message").await.unwrap();
        store.append("s1", "assistant", "réponse").await.unwrap();
        assert!(store.has_messages("s1").await);

        let history = store.history("s1", 5).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "premier message");
        assert_eq!(store.backend_name(), "sqlite");
    }
}
