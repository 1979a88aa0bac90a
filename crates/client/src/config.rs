//! Client configuration.

use serde::{Deserialize, Serialize};

use iamgate_auth::VerifierConfig;
use iamgate_transport::BreakerConfig;

use crate::actions::SERVICE_NAME;

/// Everything needed to reach and trust the remote IAM service.
///
/// Every field has a default, so a partial document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IamClientConfig {
    /// Logical name passed to service discovery.
    pub service_name: String,
    /// Transport adapter name recorded on every request envelope.
    pub transport: String,
    /// Applied to each facade's breaker independently.
    pub breaker: BreakerConfig,
    pub verifier: VerifierConfig,
}

impl Default for IamClientConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            transport: "http".to_string(),
            breaker: BreakerConfig::default(),
            verifier: VerifierConfig::default(),
        }
    }
}

impl IamClientConfig {
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.transport = transport.into();
        self
    }

    pub fn with_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_verifier(mut self, verifier: VerifierConfig) -> Self {
        self.verifier = verifier;
        self
    }
}
