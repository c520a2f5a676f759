/// SQLite-backed durable output cache.
///
/// Rows live in an `outputs` table whose `UNIQUE(source_img)` constraint is
/// the only guard against two concurrent requests caching the same image.
/// Inserts use `ON CONFLICT DO NOTHING`, so a losing writer sees `false`
/// instead of an error and the first row wins.
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};

use screentask_core::{OutputCache, OutputRecord};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS outputs (
     id          INTEGER PRIMARY KEY AUTOINCREMENT,
     name        TEXT NOT NULL,
     description TEXT NOT NULL,
     category    TEXT NOT NULL,
     source_img  TEXT NOT NULL UNIQUE,
     created_at  INTEGER NOT NULL
 );
 CREATE INDEX IF NOT EXISTS idx_outputs_category ON outputs(category);";

pub struct SqliteOutputCache {
    conn: Mutex<Connection>,
}

impl SqliteOutputCache {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .context("Failed to open SQLite output cache")?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize outputs schema")?;

        info!("SqliteOutputCache opened at {:?}", path.as_ref());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Total number of cached rows.
    pub async fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM outputs", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl OutputCache for SqliteOutputCache {
    async fn lookup(&self, source_img: &str) -> Result<Option<OutputRecord>> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                "SELECT name, description, category, source_img
                 FROM outputs WHERE source_img = ?1",
                params![source_img],
                row_to_record,
            )
            .optional()
            .context("Failed to query outputs")?;
        Ok(record)
    }

    async fn insert(&self, record: &OutputRecord) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "INSERT INTO outputs (name, description, category, source_img, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(source_img) DO NOTHING",
                params![
                    record.name,
                    record.description,
                    record.category,
                    record.source_img,
                    chrono::Utc::now().timestamp(),
                ],
            )
            .context("Failed to insert output")?;
        debug!(source_img = %record.source_img, inserted = changed > 0, "Cached output");
        Ok(changed > 0)
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<OutputRecord> {
    Ok(OutputRecord {
        name: row.get(0)?,
        description: row.get(1)?,
        category: row.get(2)?,
        source_img: row.get(3)?,
    })
}
