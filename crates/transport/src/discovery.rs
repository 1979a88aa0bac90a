//! Service discovery contract (logical name → host/port).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use iamgate_core::{IamError, IamResult};

/// Where a remote service can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl core::fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    async fn get_service(&self, name: &str) -> IamResult<ServiceEndpoint>;
}

/// Fixed name → endpoint table, for tests and single-host deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    services: HashMap<String, ServiceEndpoint>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, name: impl Into<String>, endpoint: ServiceEndpoint) -> Self {
        self.services.insert(name.into(), endpoint);
        self
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn get_service(&self, name: &str) -> IamResult<ServiceEndpoint> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| IamError::Discovery(format!("unknown service '{name}'")))
    }
}
