//! HTTP surface for the zoo registry and the time-series query proxy.

pub mod config;
pub mod error;
pub mod server;
