//! Shared plumbing for the timeline crates.
//!
//! Right now this is only the [`observability`] module, which owns the process-wide
//! `tracing` setup used by the `timeline` binary and by integration tests.
//!
//! ```rust
//! use timeline_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "timeline");
//! assert_eq!(cfg.default_filter, "info");
//! ```
pub mod observability;
