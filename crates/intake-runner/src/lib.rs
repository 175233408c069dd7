//! Intake Runner Library
//!
//! The invocation wrapper around the pipeline: maps an opaque trigger event
//! to a connector, runs the pipeline once, and reports a structured
//! response. Anything that goes wrong before the pipeline starts becomes a
//! 500-shaped response; the pipeline itself cannot fail its caller.

pub mod event;
pub mod handler;
pub mod response;

pub use event::{Context, Event};
pub use handler::handle;
pub use response::{Response, ResponseBody};
