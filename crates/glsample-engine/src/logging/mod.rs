//! Logging utilities.
//!
//! Centralizes logger initialization. Samples log through the `log` facade only.

mod init;

pub use init::{init_logging, LoggingConfig};
