use serde::{Deserialize, Serialize};
use serde_json::Value;

use iamgate_core::CorrelationId;

/// Status carried by a successful response.
pub const STATUS_OK: i32 = 0;

/// Envelope for one action request or its response.
///
/// Notes:
/// - A response reuses the request's `correlation_id`; pairing is strictly 1:1.
/// - `transport` names the adapter the request was sent over (e.g. `http`).
/// - `status == 0` means success with `data` as payload; anything else is an
///   application-level failure described by `status` and `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedMessage {
    correlation_id: CorrelationId,
    action: String,
    transport: String,

    #[serde(default)]
    data: Value,

    #[serde(default)]
    status: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CorrelatedMessage {
    pub fn request(
        correlation_id: CorrelationId,
        action: impl Into<String>,
        transport: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            correlation_id,
            action: action.into(),
            transport: transport.into(),
            data,
            status: STATUS_OK,
            message: None,
        }
    }

    /// Successful response to this message.
    pub fn reply(&self, data: Value) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            action: self.action.clone(),
            transport: self.transport.clone(),
            data,
            status: STATUS_OK,
            message: None,
        }
    }

    /// Failed response to this message.
    pub fn fail(&self, status: i32, message: impl Into<String>) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            action: self.action.clone(),
            transport: self.transport.clone(),
            data: Value::Null,
            status,
            message: Some(message.into()),
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn transport(&self) -> &str {
        &self.transport
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// Same envelope under another correlation id.
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}
