//! Core types and traits for the zoo registry and time-series query service.
//!
//! Query DTOs serialize in camelCase to match the public JSON contract.

mod audit;
mod dto;
mod time;
mod traits;

pub use audit::*;
pub use dto::*;
pub use time::{format_utc_timestamp, parse_utc_timestamp};
pub use traits::*;
