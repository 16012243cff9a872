//! SQLite-backed time-series store. One connection per session, closed on drop.

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, InterruptHandle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zoo_types::{
    format_utc_timestamp, parse_utc_timestamp, AuditRecord, RangeQuery, StoreError, StoreSession,
    TagEventRow, TimeSeriesStore,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS timeseries_data (
        tag_id INTEGER NOT NULL,
        time_stamp TEXT NOT NULL,
        value REAL NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_timeseries_tag_time ON timeseries_data(tag_id, time_stamp);

    CREATE TABLE IF NOT EXISTS query_audit_log (
        app_context_guid TEXT NOT NULL,
        function_name TEXT NOT NULL,
        start_date_utc TEXT NOT NULL,
        end_date_utc TEXT NOT NULL,
        row_total INTEGER NOT NULL,
        status TEXT NOT NULL,
        last_error TEXT,
        run_timestamp_utc TEXT NOT NULL
    );
"#;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite time-series store. `target` is a file path or a `file:` URI.
pub struct SqliteTimeSeriesStore {
    target: String,
    busy_timeout: Duration,
}

impl SqliteTimeSeriesStore {
    /// Create the store and make sure both tables exist.
    pub fn new(target: impl Into<String>) -> Result<Self, StoreError> {
        let store = Self {
            target: target.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(store)
    }

    /// How long a session waits on a locked database before failing.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        connect_to(&self.target, self.busy_timeout)
    }

    /// Open a connection on the blocking pool.
    async fn connect_blocking(&self) -> Result<Connection, StoreError> {
        let target = self.target.clone();
        let busy_timeout = self.busy_timeout;
        tokio::task::spawn_blocking(move || connect_to(&target, busy_timeout))
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?
    }

    /// Load rows into the time-series table in one transaction.
    pub async fn append_events(&self, rows: &[TagEventRow]) -> Result<(), StoreError> {
        let conn = self.connect_blocking().await?;
        let rows = rows.to_vec();
        tokio::task::spawn_blocking(move || -> Result<(), rusqlite::Error> {
            let tx = conn.unchecked_transaction()?;
            for row in &rows {
                tx.execute(
                    "INSERT INTO timeseries_data (tag_id, time_stamp, value) VALUES (?1, ?2, ?3)",
                    rusqlite::params![row.tag_id, format_utc_timestamp(&row.time_stamp), row.value],
                )?;
            }
            tx.commit()
        })
        .await
        .map_err(|e| StoreError::Other(e.to_string()))?
        .map_err(|e| StoreError::Query(e.to_string()))
    }
}

fn connect_to(target: &str, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let conn = Connection::open(target).map_err(|e| StoreError::Connect(e.to_string()))?;
    conn.busy_timeout(busy_timeout)
        .map_err(|e| StoreError::Connect(e.to_string()))?;
    Ok(conn)
}

#[async_trait]
impl TimeSeriesStore for SqliteTimeSeriesStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        let conn = self.connect_blocking().await?;
        let interrupt = conn.get_interrupt_handle();
        Ok(Box::new(SqliteSession {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        }))
    }
}

/// One open connection. Dropping the session closes it once no blocking call holds it.
struct SqliteSession {
    conn: Arc<Mutex<Connection>>,
    interrupt: InterruptHandle,
}

impl SqliteSession {
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        // Dropped before completion when the caller times out: stop the running statement
        // so the connection is released instead of finishing the query in the background.
        let mut guard = InterruptOnDrop {
            handle: &self.interrupt,
            armed: true,
        };
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Other(format!("failed to acquire lock: {}", e)))?;
            f(&*conn)
        })
        .await
        .map_err(|e| StoreError::Other(e.to_string()))?;
        guard.armed = false;
        result
    }
}

struct InterruptOnDrop<'a> {
    handle: &'a InterruptHandle,
    armed: bool,
}

impl Drop for InterruptOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("interrupting in-flight sqlite statement");
            self.handle.interrupt();
        }
    }
}

#[async_trait]
impl StoreSession for SqliteSession {
    async fn fetch_events(&mut self, query: &RangeQuery) -> Result<Vec<TagEventRow>, StoreError> {
        if query.tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = query.clone();
        self.with_conn(move |conn| select_events(conn, &query)).await
    }

    async fn insert_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO query_audit_log (app_context_guid, function_name, start_date_utc, end_date_utc, row_total, status, last_error, run_timestamp_utc) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    record.app_context_guid,
                    record.function_name,
                    format_utc_timestamp(&record.start_date_utc),
                    format_utc_timestamp(&record.end_date_utc),
                    record.row_total,
                    record.status.as_str(),
                    record.last_error,
                    format_utc_timestamp(&record.run_timestamp_utc),
                ],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

/// Builds the IN-list from `?` placeholders only; tag ids and bounds are bound parameters.
fn select_sql(tag_count: usize) -> String {
    let placeholders = vec!["?"; tag_count].join(", ");
    format!(
        "SELECT tag_id, time_stamp, value FROM timeseries_data \
         WHERE tag_id IN ({}) \
         AND julianday(time_stamp) BETWEEN julianday(?) AND julianday(?) \
         ORDER BY tag_id ASC, julianday(time_stamp) ASC",
        placeholders
    )
}

fn floor_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(dt.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(dt)
}

fn ceil_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floor = floor_millis(dt);
    if floor == dt {
        dt
    } else {
        floor + chrono::Duration::milliseconds(1)
    }
}

/// `julianday` resolves to the millisecond, so bounds are rounded inward: start up, end down.
/// Truncating the start would admit rows earlier than the requested instant.
fn bound_params(query: &RangeQuery) -> [Value; 2] {
    [
        Value::Text(format_utc_timestamp(&ceil_millis(query.start))),
        Value::Text(format_utc_timestamp(&floor_millis(query.end))),
    ]
}

fn select_events(conn: &Connection, query: &RangeQuery) -> Result<Vec<TagEventRow>, StoreError> {
    let sql = select_sql(query.tag_ids.len());
    let params: Vec<Value> = query
        .tag_ids
        .iter()
        .map(|id| Value::Integer(*id))
        .chain(bound_params(query))
        .collect();

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StoreError::Query(e.to_string()))?;
    let raw = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })
        .map_err(|e| StoreError::Query(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Query(e.to_string()))?;

    raw.into_iter()
        .map(|(tag_id, ts, value)| {
            let time_stamp = parse_utc_timestamp(&ts).ok_or_else(|| {
                StoreError::Query(format!("unparsable time_stamp {:?} for tag {}", ts, tag_id))
            })?;
            Ok(TagEventRow {
                tag_id,
                time_stamp,
                value,
            })
        })
        .collect()
}
