use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, StripError};
use crate::domain::WatermarkMap;
use crate::store::WatermarkStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| StripError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            StripError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

impl WatermarkStore for SqliteStore {
    fn load(&self) -> Result<WatermarkMap> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT source_id, last_seen FROM watermarks ORDER BY source_id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut watermarks = WatermarkMap::new();
        for (source_id, last_seen) in rows {
            match DateTime::<Utc>::from_timestamp(last_seen, 0) {
                Some(timestamp) => {
                    watermarks.insert(source_id, timestamp);
                }
                None => {
                    tracing::warn!(source = %source_id, last_seen, "Ignoring out-of-range watermark");
                }
            }
        }

        Ok(watermarks)
    }

    fn save(&self, watermarks: &WatermarkMap) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        for (source_id, last_seen) in watermarks {
            tx.execute(
                "INSERT INTO watermarks (source_id, last_seen, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(source_id) DO UPDATE SET last_seen = excluded.last_seen,
                                                      updated_at = excluded.updated_at
                 WHERE excluded.last_seen <> watermarks.last_seen",
                params![source_id, last_seen.timestamp(), now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}
