//! SQLite-backed secret store.
//!
//! Records live in a single `secrets` table with an absolute expiry in
//! milliseconds. The destructive read is one `DELETE ... RETURNING`
//! statement, so it stays atomic even when several processes share the
//! database file.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::store::SecretStore;
use oncelink_common::{Error, Result, StorageKey};

/// How long a statement waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS secrets (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL,
        expires_at_ms INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_secrets_expiry ON secrets(expires_at_ms);
"#;

/// Secret store persisted in SQLite.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create or open a store database.
    ///
    /// # Errors
    /// - `StoreUnavailable` if the file cannot be opened
    /// - `Storage` if the schema cannot be created
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path).map_err(map_sqlite_error)?;
        let store = Self::init(conn)?;

        info!("SQLite store opened at {}", db_path.display());
        Ok(store)
    }

    /// Create a private in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sqlite_error)?;
        // WAL lets readers proceed while another process writes.
        conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))
            .map_err(map_sqlite_error)?;
        conn.execute_batch(SCHEMA).map_err(map_sqlite_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| Error::StoreUnavailable("SQLite connection lock poisoned".to_string()))?;
            f(&conn).map_err(map_sqlite_error)
        })
        .await
        .map_err(|e| Error::StoreUnavailable(format!("Store task failed: {}", e)))?
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Translate SQLite failures into the common taxonomy.
///
/// Anything that means "the database cannot be used right now" becomes
/// `StoreUnavailable`; the rest are reported as plain storage errors.
fn map_sqlite_error(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly => Error::StoreUnavailable(err.to_string()),
            _ => Error::Storage(err.to_string()),
        },
        _ => Error::Storage(err.to_string()),
    }
}

#[async_trait]
impl SecretStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn put(&self, key: &StorageKey, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = now_ms();
        let ttl_ms = i64::try_from(ttl.as_millis())
            .map_err(|_| Error::InvalidInput(format!("TTL out of range: {:?}", ttl)))?;
        let expires_at = now.saturating_add(ttl_ms);
        let key_text = key.as_str().to_string();

        // An expired row left behind by lazy expiry may be overwritten; a live
        // one may not.
        let changed = self
            .with_conn(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO secrets (key, value, expires_at_ms)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE
                        SET value = excluded.value, expires_at_ms = excluded.expires_at_ms
                        WHERE secrets.expires_at_ms <= ?4
                    "#,
                    params![key_text, value, expires_at, now],
                )
            })
            .await?;

        if changed == 0 {
            return Err(Error::AlreadyExists(format!("Key already stored: {}", key)));
        }

        debug!("Stored record {} for {:?}", key, ttl);
        Ok(())
    }

    async fn fetch_and_delete(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
        let key_text = key.as_str().to_string();
        let now = now_ms();

        self.with_conn(move |conn| {
            conn.query_row(
                "DELETE FROM secrets WHERE key = ?1 AND expires_at_ms > ?2 RETURNING value",
                params![key_text, now],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
        })
        .await
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        let key_text = key.as_str().to_string();
        let now = now_ms();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM secrets WHERE key = ?1 AND expires_at_ms > ?2)",
                params![key_text, now],
                |row| row.get::<_, bool>(0),
            )
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map(|_| ())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = now_ms();
        let purged = self
            .with_conn(move |conn| {
                conn.execute("DELETE FROM secrets WHERE expires_at_ms <= ?1", params![now])
            })
            .await?;

        if purged > 0 {
            debug!("Purged {} expired record(s)", purged);
        }
        Ok(purged)
    }
}
