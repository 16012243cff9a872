//! In-memory time-series store for tests and local runs: fixed rows, captured audit records,
//! and injectable failures.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use zoo_types::{AuditRecord, RangeQuery, StoreError, StoreSession, TagEventRow, TimeSeriesStore};

#[derive(Debug, Clone, Default)]
struct Faults {
    open: Option<String>,
    /// Opens that fail before `open` starts succeeding; `None` fails every open.
    open_failures: Option<usize>,
    open_delay: Option<Duration>,
    query: Option<String>,
    audit: Option<String>,
    query_delay: Option<Duration>,
}

/// In-memory implementation of TimeSeriesStore.
pub struct InMemoryTimeSeriesStore {
    rows: Arc<RwLock<Vec<TagEventRow>>>,
    audits: Arc<RwLock<Vec<AuditRecord>>>,
    faults: Faults,
    /// Sessions currently open (opened and not yet dropped).
    open_sessions: Arc<AtomicUsize>,
    /// Sessions ever opened.
    opened_total: Arc<AtomicUsize>,
    open_attempts: Arc<AtomicUsize>,
}

impl InMemoryTimeSeriesStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            audits: Arc::new(RwLock::new(Vec::new())),
            faults: Faults::default(),
            open_sessions: Arc::new(AtomicUsize::new(0)),
            opened_total: Arc::new(AtomicUsize::new(0)),
            open_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_rows(self, rows: Vec<TagEventRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            ..self
        }
    }

    /// Every `open` fails with `StoreError::Connect(msg)`.
    pub fn failing_open(mut self, msg: impl Into<String>) -> Self {
        self.faults.open = Some(msg.into());
        self.faults.open_failures = None;
        self
    }

    /// The first `count` opens fail with `StoreError::Connect(msg)`; later opens succeed.
    pub fn failing_first_opens(mut self, count: usize, msg: impl Into<String>) -> Self {
        self.faults.open = Some(msg.into());
        self.faults.open_failures = Some(count);
        self
    }

    /// `open` sleeps this long before answering.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.faults.open_delay = Some(delay);
        self
    }

    /// Every `fetch_events` fails with `StoreError::Query(msg)`.
    pub fn failing_query(mut self, msg: impl Into<String>) -> Self {
        self.faults.query = Some(msg.into());
        self
    }

    /// Every `insert_audit` fails with `StoreError::Query(msg)`.
    pub fn failing_audit(mut self, msg: impl Into<String>) -> Self {
        self.faults.audit = Some(msg.into());
        self
    }

    /// `fetch_events` sleeps this long before answering.
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.faults.query_delay = Some(delay);
        self
    }

    pub async fn push_rows(&self, rows: impl IntoIterator<Item = TagEventRow>) {
        self.rows.write().await.extend(rows);
    }

    /// Audit records written so far, oldest first.
    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.audits.read().await.clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryTimeSeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeSeriesStore for InMemoryTimeSeriesStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        if let Some(delay) = self.faults.open_delay {
            tokio::time::sleep(delay).await;
        }
        let attempt = self.open_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(ref msg) = self.faults.open {
            if self.faults.open_failures.map_or(true, |n| attempt < n) {
                return Err(StoreError::Connect(msg.clone()));
            }
        }
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            rows: Arc::clone(&self.rows),
            audits: Arc::clone(&self.audits),
            faults: self.faults.clone(),
            open_sessions: Arc::clone(&self.open_sessions),
        }))
    }
}

struct MemorySession {
    rows: Arc<RwLock<Vec<TagEventRow>>>,
    audits: Arc<RwLock<Vec<AuditRecord>>>,
    faults: Faults,
    open_sessions: Arc<AtomicUsize>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn fetch_events(&mut self, query: &RangeQuery) -> Result<Vec<TagEventRow>, StoreError> {
        if let Some(delay) = self.faults.query_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref msg) = self.faults.query {
            return Err(StoreError::Query(msg.clone()));
        }
        let guard = self.rows.read().await;
        let mut out: Vec<TagEventRow> = guard
            .iter()
            .filter(|r| query.tag_ids.contains(&r.tag_id))
            .filter(|r| r.time_stamp >= query.start && r.time_stamp <= query.end)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.tag_id
                .cmp(&b.tag_id)
                .then_with(|| a.time_stamp.cmp(&b.time_stamp))
        });
        Ok(out)
    }

    async fn insert_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        if let Some(ref msg) = self.faults.audit {
            return Err(StoreError::Query(msg.clone()));
        }
        self.audits.write().await.push(record.clone());
        Ok(())
    }
}
