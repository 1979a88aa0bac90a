use std::sync::Arc;

use iamgate_auth::Identity;
use iamgate_core::{CorrelationId, IamResult};
use iamgate_transport::{ActionDispatcher, MessageChannel, ServiceDiscovery};

use crate::actions::UserAction;
use crate::config::IamClientConfig;
use crate::dto::{CreateUserRequest, DeleteUserRequest, PageQuery, Paginated, UpdateUserRequest, UserLookup};

/// User administration.
pub struct UserService {
    dispatcher: ActionDispatcher,
}

impl UserService {
    pub const BREAKER_NAME: &'static str = "iam-user";

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

    pub async fn get_users(
        &self,
        query: &PageQuery,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<Paginated<Identity>> {
        self.dispatcher
            .send_as(UserAction::GetUsers.as_str(), query, correlation_id)
            .await
    }

    pub async fn get_user(&self, lookup: &UserLookup, correlation_id: Option<CorrelationId>) -> IamResult<Identity> {
        self.dispatcher
            .send_as(UserAction::GetUser.as_str(), lookup, correlation_id)
            .await
    }

    pub async fn create_user(
        &self,
        data: &CreateUserRequest,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<Identity> {
        self.dispatcher
            .send_as(UserAction::CreateUser.as_str(), data, correlation_id)
            .await
    }

    pub async fn update_user(
        &self,
        data: &UpdateUserRequest,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<Identity> {
        self.dispatcher
            .send_as(UserAction::UpdateUser.as_str(), data, correlation_id)
            .await
    }

    pub async fn delete_user(&self, id: impl Into<String>, correlation_id: Option<CorrelationId>) -> IamResult<()> {
        let data = DeleteUserRequest { id: id.into() };
        self.dispatcher
            .send_unit(UserAction::DeleteUser.as_str(), &data, correlation_id)
            .await
    }
}
