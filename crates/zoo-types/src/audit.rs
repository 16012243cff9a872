//! Audit types: one record per query attempt that reaches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one query attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    ZeroRows,
    Failure,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Success => "Success",
            AuditStatus::ZeroRows => "ZeroRows",
            AuditStatus::Failure => "Failure",
        }
    }

    /// Status for a query that completed with `row_total` rows.
    pub fn for_row_total(row_total: usize) -> Self {
        if row_total == 0 {
            AuditStatus::ZeroRows
        } else {
            AuditStatus::Success
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted description of one query attempt. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub app_context_guid: String,
    pub function_name: String,
    pub start_date_utc: DateTime<Utc>,
    pub end_date_utc: DateTime<Utc>,
    pub row_total: i64,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub run_timestamp_utc: DateTime<Utc>,
}
