//! SQLite file engine.
//!
//! # Responsibility
//! - Persist each collection as a `(record_key, body)` table with JSON bodies.
//! - Bootstrap connections and run schema migrations before first use.
//!
//! # Invariants
//! - One connection per engine; requests are serialized through a mutex.
//! - Returned engines have migrations fully applied.

use super::migrations::{apply_migrations, current_user_version};
use super::record::record_key;
use super::{Collection, DbError, DbResult, Record, RecordStore};
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Durable engine backed by one SQLite database.
#[derive(Debug)]
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (creating if needed) the database file and applies migrations.
    ///
    /// # Errors
    /// - `StoreUnavailable` when the file or its directory cannot be used.
    /// - `UnsupportedSchemaVersion` when the file was written by a newer build.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            if let Err(err) = std::fs::create_dir_all(parent) {
                error!(
                    "event=db_open module=db status=error mode=file duration_ms={} error_code=db_dir_unavailable",
                    started_at.elapsed().as_millis()
                );
                return Err(DbError::StoreUnavailable(format!(
                    "cannot create `{}`: {err}",
                    parent.display()
                )));
            }
        }

        let conn = Connection::open(path).map_err(|err| {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed",
                started_at.elapsed().as_millis()
            );
            DbError::StoreUnavailable(err.to_string())
        })?;
        Self::bootstrap(conn, "file", started_at)
    }

    /// Opens a private in-memory SQLite database with migrations applied.
    pub fn open_in_memory() -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");
        let conn = Connection::open_in_memory()
            .map_err(|err| DbError::StoreUnavailable(err.to_string()))?;
        Self::bootstrap(conn, "memory", started_at)
    }

    fn bootstrap(mut conn: Connection, mode: &str, started_at: Instant) -> DbResult<Self> {
        match configure(&mut conn) {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(match err {
                    DbError::Sqlite(inner) => DbError::StoreUnavailable(inner.to_string()),
                    other => other,
                })
            }
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DbError::LockPoisoned("sqlite connection"))
    }
}

fn configure(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)
}

impl RecordStore for SqliteRecordStore {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    fn schema_version(&self) -> DbResult<u32> {
        let conn = self.lock()?;
        current_user_version(&conn)
    }

    fn get(&self, collection: Collection, key: &str) -> DbResult<Option<Record>> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                &format!("SELECT body FROM {} WHERE record_key = ?1;", collection.name()),
                [key],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|body| parse_body(collection, key, &body))
            .transpose()
    }

    fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT record_key, body FROM {} ORDER BY record_key ASC;",
            collection.name()
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let body: String = row.get(1)?;
            records.push(parse_body(collection, &key, &body)?);
        }
        Ok(records)
    }

    fn add(&self, collection: Collection, record: Record) -> DbResult<()> {
        let key = record_key(collection, &record)?;
        let body = Value::Object(record).to_string();
        let conn = self.lock()?;
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (record_key, body) VALUES (?1, ?2);",
                collection.name()
            ),
            params![key, body],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(DbError::KeyExists { collection, key })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, collection: Collection, record: Record) -> DbResult<()> {
        let key = record_key(collection, &record)?;
        let body = Value::Object(record).to_string();
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (record_key, body) VALUES (?1, ?2)
                 ON CONFLICT(record_key) DO UPDATE SET body = excluded.body;",
                collection.name()
            ),
            params![key, body],
        )?;
        Ok(())
    }

    fn delete(&self, collection: Collection, key: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!("DELETE FROM {} WHERE record_key = ?1;", collection.name()),
            [key],
        )?;
        Ok(())
    }
}

fn parse_body(collection: Collection, key: &str, body: &str) -> DbResult<Record> {
    let corrupt = |reason: String| DbError::CorruptRecord {
        collection,
        key: key.to_string(),
        reason,
    };
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(corrupt("body is not a JSON object".to_string())),
        Err(err) => Err(corrupt(err.to_string())),
    }
}
