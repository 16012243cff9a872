//! Request and response DTOs for the registry and the time-series query endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry entity as stored and returned by `/api/zoo/v1/animals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

/// Create-animal body. Any `id` sent by the client is ignored; the registry assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnimal {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl NewAnimal {
    pub fn with_id(self, id: i64) -> Animal {
        Animal {
            id,
            kind: self.kind,
            name: self.name,
        }
    }
}

/// One tag of interest in a query request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    pub tag_name: String,
    pub tag_id: i64,
}

/// Query request exactly as it arrives on the wire. Every field is required and typed;
/// dates stay strings here so that parse failures can be reported separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestBody {
    pub tags: Vec<TagRequest>,
    pub start_date: String,
    pub end_date: String,
    pub app_context_guid: String,
}

/// Validated query request: dates parsed to UTC and `start_date <= end_date`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub tags: Vec<TagRequest>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub app_context_guid: String,
}

/// Single observation of a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesEvent {
    pub time_stamp: DateTime<Utc>,
    pub value: f64,
}

/// Per-tag response entry; present for every requested tag, even with no events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub tag_name: String,
    pub tag_id: i64,
    pub app_context_guid: String,
    pub events: Vec<TimeSeriesEvent>,
}

/// Error body for 422 and 500 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
}

/// Row read from the time-series table.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEventRow {
    pub tag_id: i64,
    pub time_stamp: DateTime<Utc>,
    pub value: f64,
}

impl TagEventRow {
    pub fn into_event(self) -> TimeSeriesEvent {
        TimeSeriesEvent {
            time_stamp: self.time_stamp,
            value: self.value,
        }
    }
}

/// Read query against the time-series table: rows whose tag id is in `tag_ids` and whose
/// timestamp lies in `[start, end]`, ordered by tag id then timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    /// Distinct, ascending.
    pub tag_ids: Vec<i64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
