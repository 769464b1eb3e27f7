//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events to stderr)
//!
//! stdout is reserved for the human-readable transfer report.
//! ```

pub mod logging;
