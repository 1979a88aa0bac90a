//! Correlated message channel contract.
//!
//! The channel is the transport layer between this client and the remote IAM
//! service. Its internals (serialization, retries, connection pooling) are out
//! of scope; the facade relies only on this contract:
//!
//! - `send` resolves with the response whose correlation id matches the request,
//!   or fails with a [`TransportError`].
//! - Concurrent sends with distinct correlation ids are never conflated.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use iamgate_core::IamError;

use crate::discovery::ServiceEndpoint;
use crate::envelope::CorrelatedMessage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("no handler registered for action '{0}'")]
    UnknownAction(String),

    #[error("channel closed")]
    Closed,
}

impl From<TransportError> for IamError {
    fn from(value: TransportError) -> Self {
        IamError::Transport(value.to_string())
    }
}

/// Request/response delivery over a named transport.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(
        &self,
        message: CorrelatedMessage,
        endpoint: &ServiceEndpoint,
    ) -> Result<CorrelatedMessage, TransportError>;
}

#[async_trait]
impl<C> MessageChannel for Arc<C>
where
    C: MessageChannel + ?Sized,
{
    async fn send(
        &self,
        message: CorrelatedMessage,
        endpoint: &ServiceEndpoint,
    ) -> Result<CorrelatedMessage, TransportError> {
        (**self).send(message, endpoint).await
    }
}
