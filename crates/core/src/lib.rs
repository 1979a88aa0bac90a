//! `iamgate-core`: shared primitives for the IAM client facade.
//!
//! Holds the error taxonomy every other crate reports through, and the
//! correlation identifier that pairs a request with its response.

pub mod error;
pub mod id;

pub use error::{IamError, IamResult};
pub use id::{CorrelationId, ParseCorrelationIdError};
