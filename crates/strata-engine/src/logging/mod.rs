//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code logs through
//! the `log` facade only; `env_logger` is installed here.

mod init;

pub use init::{init_logging, LoggingConfig};
