//! Correlated action dispatch through the circuit breaker.
//!
//! ```text
//! facade ── send_action ──▶ ActionDispatcher ──▶ CircuitBreaker ──▶ MessageChannel ──▶ remote
//! ```
//!
//! The dispatcher owns the correlation protocol: it stamps every request with a
//! correlation id (fresh UUIDv4 unless the caller supplies one), rejects any
//! response that carries a different id, and turns a non-zero response status
//! into [`IamError::RemoteActionFailed`] with status and message untouched.
//!
//! Breaker accounting: transport failures, correlation mismatches and timeouts
//! count as failures. A non-zero status is a completed round trip and does not.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use iamgate_core::{CorrelationId, IamError, IamResult};

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::channel::MessageChannel;
use crate::discovery::{ServiceDiscovery, ServiceEndpoint};
use crate::envelope::CorrelatedMessage;

/// Sends actions to one remote service.
///
/// Holds a channel handle, the resolved endpoint and its own breaker; several
/// dispatchers may share one channel.
pub struct ActionDispatcher {
    channel: Arc<dyn MessageChannel>,
    endpoint: ServiceEndpoint,
    transport: String,
    breaker: CircuitBreaker,
}

impl ActionDispatcher {
    pub fn new(
        channel: Arc<dyn MessageChannel>,
        endpoint: ServiceEndpoint,
        transport: impl Into<String>,
        breaker: CircuitBreaker,
    ) -> Self {
        Self {
            channel,
            endpoint,
            transport: transport.into(),
            breaker,
        }
    }

    /// Resolve `service_name` once and bind a dispatcher to it.
    pub async fn connect(
        discovery: &dyn ServiceDiscovery,
        service_name: &str,
        channel: Arc<dyn MessageChannel>,
        transport: impl Into<String>,
        breaker_name: impl Into<String>,
        breaker: BreakerConfig,
    ) -> IamResult<Self> {
        let endpoint = discovery.get_service(service_name).await?;
        debug!(service = service_name, %endpoint, "resolved remote service");
        Ok(Self::new(
            channel,
            endpoint,
            transport,
            CircuitBreaker::new(breaker_name, breaker),
        ))
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &str {
        &self.transport
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Send `action` with a raw JSON payload and return the response `data`.
    pub async fn send(
        &self,
        action: &str,
        data: Value,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<Value> {
        let correlation_id = correlation_id.unwrap_or_else(CorrelationId::generate);
        let request = CorrelatedMessage::request(correlation_id.clone(), action, &self.transport, data);

        debug!(%correlation_id, action, "dispatching action");

        let response = self
            .breaker
            .call(async {
                let response = self.channel.send(request, &self.endpoint).await?;
                if response.correlation_id() != &correlation_id {
                    return Err(IamError::CorrelationMismatch {
                        expected: correlation_id.to_string(),
                        actual: response.correlation_id().to_string(),
                    });
                }
                Ok::<_, IamError>(response)
            })
            .await
            .map_err(|e| {
                let e = IamError::from(e);
                warn!(%correlation_id, action, error = %e, "action dispatch failed");
                e
            })?;

        if !response.is_success() {
            warn!(
                %correlation_id,
                action,
                status = response.status(),
                remote_message = response.message().unwrap_or_default(),
                "remote action failed"
            );
            return Err(IamError::remote(
                response.status(),
                response.message().map(str::to_string),
            ));
        }

        debug!(%correlation_id, action, "action completed");
        Ok(response.into_data())
    }

    /// Send a typed payload and decode the typed response.
    pub async fn send_as<P, R>(
        &self,
        action: &str,
        payload: &P,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let data = serde_json::to_value(payload)?;
        let data = self.send(action, data, correlation_id).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Send a typed payload whose response carries nothing of interest.
    pub async fn send_unit<P>(
        &self,
        action: &str,
        payload: &P,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<()>
    where
        P: Serialize + ?Sized,
    {
        let data = serde_json::to_value(payload)?;
        self.send(action, data, correlation_id).await.map(|_| ())
    }
}
