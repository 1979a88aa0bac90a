//! One facade per IAM resource. Each owns a dispatcher and therefore its own
//! circuit breaker, so an outage of one action group does not open the others.

mod auth;
mod role;
mod user;

pub use auth::AuthService;
pub use role::RoleService;
pub use user::UserService;

use std::sync::Arc;

use iamgate_core::IamResult;
use iamgate_transport::{ActionDispatcher, MessageChannel, ServiceDiscovery};

use crate::config::IamClientConfig;

async fn connect_dispatcher(
    discovery: &dyn ServiceDiscovery,
    channel: Arc<dyn MessageChannel>,
    config: &IamClientConfig,
    breaker_name: &str,
) -> IamResult<ActionDispatcher> {
    ActionDispatcher::connect(
        discovery,
        &config.service_name,
        channel,
        config.transport.clone(),
        breaker_name,
        config.breaker.clone(),
    )
    .await
}
