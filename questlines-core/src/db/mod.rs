mod questlines;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{StoreError, StoreResult};

/// Shared handle to the questline store.
///
/// Cloning is cheap; all clones serialize on the same SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Opened database");
        Self::from_connection(conn)
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// `<data dir>/questlines.db`, e.g. `~/.local/share/questlines/questlines.db`.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "questlines")
            .context("could not determine a data directory for this platform")?;
        Ok(dirs.data_dir().join("questlines.db"))
    }

    /// Private in-memory database, used by tests.
    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self::from_connection(conn)?;
        db.migrate()?;
        Ok(db)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        // Cascades and cross-table integrity depend on this being on.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("failed to enable foreign keys")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Apply the schema. Safe to run on every start.
    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(schema::SCHEMA)
            .context("failed to apply schema")?;
        tracing::info!("Database schema up to date");
        Ok(())
    }

    /// Whether the store answers a trivial query.
    pub fn ping(&self) -> bool {
        let Ok(conn) = self.lock() else {
            return false;
        };
        match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                false
            }
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Current time in the stored text format.
///
/// Fixed millisecond precision keeps lexical order equal to time order.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
