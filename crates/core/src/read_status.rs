//! Read-status persistence.
//!
//! [`ReadStatusStore`] records which content paths have been read and when. It owns exactly one
//! SQLite connection, in memory or on disk, behind a mutex, so reads and writes are serialised
//! without any further locking in the callers.
//!
//! Timestamps are issued by the store and strictly increase across writes. Two marks in the same
//! clock tick still order correctly, which keeps [`ReadStatusStore::last_read`] honest for the
//! "resume where I left off" view.

use crate::constants::{READ_AT_FORMAT, READ_STATUS_SCHEMA};
use crate::{CoreError, CoreResult, StorageMode};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// A path and the last time it was marked as read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusRecord {
    pub path: String,
    pub read_at: DateTime<Utc>,
}

struct StoreState {
    conn: Connection,
    /// Latest timestamp handed out, used to keep writes strictly ordered.
    last_issued: Option<DateTime<Utc>>,
}

/// SQLite-backed read-status store.
pub struct ReadStatusStore {
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for ReadStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStatusStore").finish_non_exhaustive()
    }
}

impl ReadStatusStore {
    /// Open the store and make sure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageOpen` if the database cannot be opened and
    /// `CoreError::SchemaSetup` if the table or index cannot be created. Both are fatal at
    /// startup.
    pub fn open(mode: &StorageMode) -> CoreResult<Self> {
        let conn = match mode {
            StorageMode::Memory => Connection::open_in_memory(),
            StorageMode::File(path) => Connection::open(path),
        }
        .map_err(CoreError::StorageOpen)?;

        conn.execute_batch(READ_STATUS_SCHEMA)
            .map_err(CoreError::SchemaSetup)?;

        let mut state = StoreState {
            conn,
            last_issued: None,
        };
        state.last_issued = latest_record(&state.conn)?.map(|record| record.read_at);

        match mode {
            StorageMode::Memory => tracing::info!("read-status store opened in memory"),
            StorageMode::File(path) => {
                tracing::info!("read-status store opened at {}", path.display())
            }
        }

        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Record that `path` was read now, replacing any earlier timestamp for it.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageQuery` if the upsert fails. The previous record is left intact.
    pub fn mark_read(&self, path: &str) -> CoreResult<ReadStatusRecord> {
        let mut state = self.lock()?;

        let mut read_at = truncate_to_micros(Utc::now());
        if let Some(last) = state.last_issued {
            if read_at <= last {
                read_at = last + Duration::microseconds(1);
            }
        }

        state.conn.execute(
            "INSERT INTO read_status (path, read_at) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET read_at = excluded.read_at",
            params![path, format_read_at(&read_at)],
        )?;
        state.last_issued = Some(read_at);

        tracing::debug!("marked as read: {}", path);
        Ok(ReadStatusRecord {
            path: path.to_string(),
            read_at,
        })
    }

    /// All paths that have been marked as read, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageQuery` if the query fails.
    pub fn list_read_paths(&self) -> CoreResult<Vec<String>> {
        let state = self.lock()?;
        let mut stmt = state
            .conn
            .prepare("SELECT path FROM read_status ORDER BY path")?;
        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    /// The most recently read record, or `None` if nothing has been read.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageQuery` if the query fails and
    /// `CoreError::InvalidTimestamp` if the stored timestamp cannot be parsed.
    pub fn last_read(&self) -> CoreResult<Option<ReadStatusRecord>> {
        let state = self.lock()?;
        latest_record(&state.conn)
    }

    /// Number of stored records.
    pub fn count(&self) -> CoreResult<usize> {
        let state = self.lock()?;
        let count: i64 = state
            .conn
            .query_row("SELECT COUNT(*) FROM read_status", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| CoreError::StorageLock)
    }
}

fn latest_record(conn: &Connection) -> CoreResult<Option<ReadStatusRecord>> {
    let row = conn
        .query_row(
            "SELECT path, read_at FROM read_status ORDER BY read_at DESC LIMIT 1",
            [],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    row.map(|(path, read_at)| {
        Ok(ReadStatusRecord {
            path,
            read_at: parse_read_at(&read_at)?,
        })
    })
    .transpose()
}

fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let micros = ts.timestamp_micros();
    DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or(ts)
}

fn format_read_at(ts: &DateTime<Utc>) -> String {
    ts.format(READ_AT_FORMAT).to_string()
}

/// Parse a stored `read_at` value.
///
/// Accepts the store's own microsecond layout as well as the shorter forms SQLite's
/// `CURRENT_TIMESTAMP` and `strftime('%f')` produce.
fn parse_read_at(raw: &str) -> CoreResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp(raw.to_string()))
}
