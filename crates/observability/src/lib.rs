//! Tracing and logging setup shared by every binary.

pub mod tracing;

pub use self::tracing::{LogFormat, LoggingConfig, init};
