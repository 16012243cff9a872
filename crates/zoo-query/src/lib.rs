//! Time-series query proxy: validate a request, read matching rows, group them per tag,
//! and record one audit row per attempt.

mod error;
mod proxy;
mod shape;
mod validate;

pub use error::{QueryError, DATE_RANGE_INVALID, INTERNAL_FAILURE, SCHEMA_INVALID};
pub use proxy::{QueryOutcome, QueryProxy, DEFAULT_QUERY_TIMEOUT};
pub use shape::{group_by_tag, range_query_for, shape_responses};
pub use validate::{parse_request, validate_request};
