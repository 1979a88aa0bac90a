//! `iamgate-transport`: resilient correlated request/response plumbing.
//!
//! The message channel and service discovery are external collaborators; this
//! crate only states their contracts and layers correlation, a per-call
//! deadline and a circuit breaker on top of them.

pub mod breaker;
pub mod channel;
pub mod discovery;
pub mod dispatcher;
pub mod envelope;
pub mod loopback;

pub use breaker::{BreakerConfig, BreakerError, BreakerStatus, CircuitBreaker, CircuitState};
pub use channel::{MessageChannel, TransportError};
pub use discovery::{ServiceDiscovery, ServiceEndpoint, StaticDiscovery};
pub use dispatcher::ActionDispatcher;
pub use envelope::{CorrelatedMessage, STATUS_OK};
pub use loopback::LoopbackChannel;
