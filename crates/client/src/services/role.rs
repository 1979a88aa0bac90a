use std::sync::Arc;

use iamgate_auth::Role;
use iamgate_core::{CorrelationId, IamResult};
use iamgate_transport::{ActionDispatcher, MessageChannel, ServiceDiscovery};

use crate::actions::RoleAction;
use crate::config::IamClientConfig;
use crate::dto::{CreateRoleRequest, DeleteRoleRequest, PageQuery, Paginated, RoleLookup, UpdateRoleRequest};

/// Role administration.
pub struct RoleService {
    dispatcher: ActionDispatcher,
}

impl RoleService {
    pub const BREAKER_NAME: &'static str = "iam-role";

    pub fn new(dispatcher: ActionDispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn connect(
        discovery: &dyn ServiceDiscovery,
        channel: Arc<dyn MessageChannel>,
        config: &IamClientConfig,
    ) -> IamResult<Self> {
        let dispatcher = super::connect_dispatcher(discovery, channel, config, Self::BREAKER_NAME).await?;
        Ok(Self::new(dispatcher))
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub async fn get_roles(&self, query: &PageQuery, correlation_id: Option<CorrelationId>) -> IamResult<Paginated<Role>> {
        self.dispatcher
            .send_as(RoleAction::GetRoles.as_str(), query, correlation_id)
            .await
    }

    pub async fn get_role(&self, lookup: &RoleLookup, correlation_id: Option<CorrelationId>) -> IamResult<Role> {
        self.dispatcher
            .send_as(RoleAction::GetRole.as_str(), lookup, correlation_id)
            .await
    }

    pub async fn create_role(&self, data: &CreateRoleRequest, correlation_id: Option<CorrelationId>) -> IamResult<Role> {
        self.dispatcher
            .send_as(RoleAction::CreateRole.as_str(), data, correlation_id)
            .await
    }

    pub async fn update_role(&self, data: &UpdateRoleRequest, correlation_id: Option<CorrelationId>) -> IamResult<Role> {
        self.dispatcher
            .send_as(RoleAction::UpdateRole.as_str(), data, correlation_id)
            .await
    }

    pub async fn delete_role(&self, id: impl Into<String>, correlation_id: Option<CorrelationId>) -> IamResult<()> {
        let data = DeleteRoleRequest { id: id.into() };
        self.dispatcher
            .send_unit(RoleAction::DeleteRole.as_str(), &data, correlation_id)
            .await
    }
}
