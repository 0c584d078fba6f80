//! Logging setup.
//!
//! Everything in this crate reports through the `log` facade. Binaries and
//! tests call [`init_logging`] once to install an `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig};
