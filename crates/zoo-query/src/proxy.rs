//! QueryProxy: validated request in, per-tag responses out, one audit record per attempt.

use crate::shape::{group_by_tag, range_query_for, shape_responses};
use crate::validate::parse_request;
use crate::QueryError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use zoo_types::{
    AuditRecord, AuditStatus, QueryRequest, StoreError, StoreSession, TagResponse, TimeSeriesStore,
};

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a query that reached the store and succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// One entry per requested tag, in request order.
    pub responses: Vec<TagResponse>,
    /// Rows returned by the store across all tags.
    pub row_total: usize,
}

impl QueryOutcome {
    pub fn is_empty(&self) -> bool {
        self.row_total == 0
    }
}

/// Time-series query proxy over a relational store.
pub struct QueryProxy {
    store: Arc<dyn TimeSeriesStore>,
    /// Recorded as `functionName` on every audit record.
    function_name: String,
    query_timeout: Duration,
}

impl QueryProxy {
    pub fn new(store: Arc<dyn TimeSeriesStore>, function_name: impl Into<String>) -> Self {
        Self {
            store,
            function_name: function_name.into(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Validate a raw JSON body and run it. Validation failures return before the store is
    /// touched and are not audited.
    pub async fn handle(&self, body: &[u8]) -> Result<QueryOutcome, QueryError> {
        let req = match parse_request(body) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(function = %self.function_name, code = e.code(), error = %e, "query rejected");
                return Err(e);
            }
        };
        self.execute(&req).await
    }

    /// Run a validated request. Opens one store session, used for both the read and the
    /// audit insert, and released on return.
    pub async fn execute(&self, req: &QueryRequest) -> Result<QueryOutcome, QueryError> {
        let query = range_query_for(req);
        let mut session = match self.open_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    guid = %req.app_context_guid,
                    error = %e,
                    "time-series store connection failed"
                );
                self.audit_detached(self.audit_record(req, AuditStatus::Failure, 0, Some(e.to_string())))
                    .await;
                return Err(e.into());
            }
        };

        let fetched = match tokio::time::timeout(self.query_timeout, session.fetch_events(&query)).await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        };

        let (record, result) = match fetched {
            Ok(rows) => {
                let row_total = rows.len();
                let grouped = group_by_tag(rows);
                let responses = shape_responses(req, &grouped);
                let status = AuditStatus::for_row_total(row_total);
                (
                    self.audit_record(req, status, row_total, None),
                    Ok(QueryOutcome {
                        responses,
                        row_total,
                    }),
                )
            }
            Err(e) => {
                tracing::error!(
                    guid = %req.app_context_guid,
                    tags = query.tag_ids.len(),
                    error = %e,
                    "time-series query failed"
                );
                (
                    self.audit_record(req, AuditStatus::Failure, 0, Some(e.to_string())),
                    Err(QueryError::from(e)),
                )
            }
        };

        if let Err(e) = self.insert_audit(session.as_mut(), &record).await {
            tracing::error!(
                guid = %req.app_context_guid,
                status = %record.status,
                error = %e,
                "audit insert failed"
            );
            if result.is_ok() {
                return Err(e.into());
            }
        } else {
            tracing::info!(
                guid = %req.app_context_guid,
                function = %self.function_name,
                tags = req.tags.len(),
                rows = record.row_total,
                status = %record.status,
                "time-series query audited"
            );
        }
        result
    }

    async fn open_session(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        match tokio::time::timeout(self.query_timeout, self.store.open()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }

    async fn insert_audit(
        &self,
        session: &mut dyn StoreSession,
        record: &AuditRecord,
    ) -> Result<(), StoreError> {
        match tokio::time::timeout(self.query_timeout, session.insert_audit(record)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }

    /// Best-effort audit on a fresh session, for when the request's own session never opened.
    async fn audit_detached(&self, record: AuditRecord) {
        let outcome = match self.open_session().await {
            Ok(mut session) => self.insert_audit(session.as_mut(), &record).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::error!(
                guid = %record.app_context_guid,
                error = %e,
                "failure audit could not be written"
            );
        }
    }

    fn audit_record(
        &self,
        req: &QueryRequest,
        status: AuditStatus,
        row_total: usize,
        last_error: Option<String>,
    ) -> AuditRecord {
        AuditRecord {
            app_context_guid: req.app_context_guid.clone(),
            function_name: self.function_name.clone(),
            start_date_utc: req.start_date,
            end_date_utc: req.end_date,
            row_total: i64::try_from(row_total).unwrap_or(i64::MAX),
            status,
            last_error,
            run_timestamp_utc: Utc::now(),
        }
    }
}
