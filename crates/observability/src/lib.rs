//! Process-wide tracing setup for services embedding the IAM client.
//!
//! The library crates only emit `tracing` events; installing a subscriber is
//! left to the host process, which calls [`init`] or [`init_with`] once at
//! startup.

pub mod tracing;

pub use crate::tracing::{LogFormat, LoggingConfig, ParseLogFormatError, init, init_with};
