//! Intake Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error taxonomy and logging setup for the intake workspace.
//!
//! # Overview
//!
//! This crate provides the pieces every intake workspace member needs:
//!
//! - **Error Handling**: the [`ImportError`] taxonomy and [`Result`] alias
//! - **Logging**: environment-driven `tracing` initialization
//!
//! # Example
//!
//! ```no_run
//! use intake_common::{ImportError, Result};
//!
//! fn require_option(value: Option<&str>) -> Result<&str> {
//!     value.ok_or_else(|| ImportError::Config("missing option".to_string()))
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ImportError, Result};
