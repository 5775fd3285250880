//! Structured, colorized logging setup.
//!
//! - [`logger`] - `configure_logger`, aligned `[LEVEL] file:line` output

pub mod logger;
