//! sqlc2proto-logging - Tracing subscriber setup for the sqlc2proto CLI
//!
//! This crate provides:
//! - [`LogLevel`] chosen from the `--verbose` / `--quiet` flags
//! - [`init_logging`] installing a stderr `fmt` subscriber with `RUST_LOG` support

mod level;
mod subscriber;

pub use level::{LogLevel, ParseLevelError};
pub use subscriber::{build_filter, fmt_subscriber, init_logging};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, init_logging};
}
