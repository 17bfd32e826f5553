//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (listener, port, priority, rule_arn)
//!     → spans per run carrying a run_id
//!
//! Consumers:
//!     → logging.rs (fmt layer on stderr, EnvFilter)
//! ```
//!
//! # Design Decisions
//! - stdout is reserved for the run report; logs go to stderr
//! - Log level configurable via config and environment

pub mod logging;
