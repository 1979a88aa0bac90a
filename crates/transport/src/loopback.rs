//! In-process channel for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::channel::{MessageChannel, TransportError};
use crate::discovery::ServiceEndpoint;
use crate::envelope::CorrelatedMessage;

type Handler = Arc<dyn Fn(&CorrelatedMessage) -> Result<CorrelatedMessage, TransportError> + Send + Sync>;

/// Channel that answers requests with registered per-action handlers.
///
/// - No network
/// - Every request is recorded (see [`LoopbackChannel::sent`])
/// - Optional artificial latency, to exercise deadlines
#[derive(Default)]
pub struct LoopbackChannel {
    handlers: Mutex<HashMap<String, Handler>>,
    sent: Mutex<Vec<CorrelatedMessage>>,
    latency: Mutex<Duration>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `action`, replacing any previous one.
    pub fn on<F>(&self, action: impl Into<String>, handler: F)
    where
        F: Fn(&CorrelatedMessage) -> Result<CorrelatedMessage, TransportError> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(action.into(), Arc::new(handler));
    }

    /// Answer `action` with `data` and status 0.
    pub fn on_data(&self, action: impl Into<String>, data: Value) {
        self.on(action, move |req| Ok(req.reply(data.clone())));
    }

    /// Answer `action` with a non-zero status.
    pub fn on_status(&self, action: impl Into<String>, status: i32, message: impl Into<String>) {
        let message = message.into();
        self.on(action, move |req| Ok(req.fail(status, message.clone())));
    }

    /// Fail every `action` request at the transport level.
    pub fn on_transport_error(&self, action: impl Into<String>, error: TransportError) {
        self.on(action, move |_| Err(error.clone()));
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Requests received so far, in arrival order.
    pub fn sent(&self) -> Vec<CorrelatedMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests received for `action`.
    pub fn calls(&self, action: &str) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| m.action() == action)
            .count()
    }
}

#[async_trait]
impl MessageChannel for LoopbackChannel {
    async fn send(
        &self,
        message: CorrelatedMessage,
        _endpoint: &ServiceEndpoint,
    ) -> Result<CorrelatedMessage, TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());

        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(message.action())
            .cloned()
            .ok_or_else(|| TransportError::UnknownAction(message.action().to_string()))?;

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        handler(&message)
    }
}
