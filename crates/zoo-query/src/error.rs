use zoo_types::StoreError;

pub const SCHEMA_INVALID: &str = "JH-4001";
pub const DATE_RANGE_INVALID: &str = "JH-4002";
pub const INTERNAL_FAILURE: &str = "JH-5001";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid request body: {0}")]
    SchemaInvalid(String),
    #[error("invalid date range: {0}")]
    DateRangeInvalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Stable error code returned to callers.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::SchemaInvalid(_) => SCHEMA_INVALID,
            QueryError::DateRangeInvalid(_) => DATE_RANGE_INVALID,
            QueryError::Store(_) => INTERNAL_FAILURE,
        }
    }

    /// Message safe to show a caller. Store failures never expose their detail.
    pub fn public_message(&self) -> String {
        match self {
            QueryError::Store(_) => "An internal error occurred while processing the request".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        !matches!(self, QueryError::Store(_))
    }
}
