//! Composition root: the three facades plus a verified session.

use std::sync::Arc;

use tracing::{info, warn};

use iamgate_auth::{AuthSession, Identity, IdentityVerifier};
use iamgate_core::{CorrelationId, IamError, IamResult};
use iamgate_transport::{MessageChannel, ServiceDiscovery};

use crate::config::IamClientConfig;
use crate::dto::{CreateTokenRequest, RefreshTokenRequest, RevokeTokenRequest, TokenPair};
use crate::fingerprint::InboundRequest;
use crate::services::{AuthService, RoleService, UserService};
use crate::token_store::RefreshTokenStore;

/// Client for the remote IAM service.
///
/// The session verifies tokens against keys fetched through the auth facade,
/// so key-set retrieval shares the auth breaker.
pub struct IamClient {
    auth: Arc<AuthService>,
    users: UserService,
    roles: RoleService,
    session: AuthSession,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl IamClient {
    pub fn new(
        auth: Arc<AuthService>,
        users: UserService,
        roles: RoleService,
        config: &IamClientConfig,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let verifier = IdentityVerifier::new(auth.clone(), config.verifier.clone());
        Self {
            auth,
            users,
            roles,
            session: AuthSession::new(Arc::new(verifier)),
            refresh_tokens,
        }
    }

    /// Resolve the IAM service and build all three facades over `channel`.
    pub async fn connect(
        config: &IamClientConfig,
        discovery: &dyn ServiceDiscovery,
        channel: Arc<dyn MessageChannel>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> IamResult<Self> {
        let auth = AuthService::connect(discovery, channel.clone(), config).await?;
        let users = UserService::connect(discovery, channel.clone(), config).await?;
        let roles = RoleService::connect(discovery, channel, config).await?;

        info!(
            service = %config.service_name,
            endpoint = %auth.dispatcher().endpoint(),
            transport = %config.transport,
            "iam client connected"
        );
        Ok(Self::new(Arc::new(auth), users, roles, config, refresh_tokens))
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn roles(&self) -> &RoleService {
        &self.roles
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Verify `token` and make its identity current.
    pub async fn set_access_token(&self, token: &str) -> IamResult<Arc<Identity>> {
        self.session.set_access_token(token).await
    }

    /// Issue tokens, establish the session and keep the refresh token.
    pub async fn sign_in(
        &self,
        credentials: CreateTokenRequest,
        request: Option<&InboundRequest>,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<(Arc<Identity>, TokenPair)> {
        let tokens = self.auth.create_token(credentials, request, correlation_id).await?;
        let identity = self.session.set_access_token(&tokens.access_token).await?;
        self.refresh_tokens
            .store(&identity.id, &tokens.refresh_token)
            .await?;
        Ok((identity, tokens))
    }

    /// Renew a session from an expired access token.
    ///
    /// The owner is read from the expired token (signature still checked), its
    /// stored refresh token is exchanged and the new pair replaces the old one.
    pub async fn refresh_session(
        &self,
        expired_access_token: &str,
        request: Option<&InboundRequest>,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<(Arc<Identity>, TokenPair)> {
        let owner = self
            .session
            .verifier()
            .resolve_expired_identity(expired_access_token)
            .await
            .ok_or_else(|| IamError::invalid_token("cannot resolve token owner"))?;

        let refresh_token = self
            .refresh_tokens
            .retrieve(&owner.id)
            .await?
            .ok_or_else(|| IamError::invalid_token("no refresh token held for user"))?;

        let tokens = match self
            .auth
            .refresh_token(RefreshTokenRequest::new(refresh_token), request, correlation_id)
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                if matches!(e, IamError::RemoteActionFailed { .. }) {
                    warn!(user_id = %owner.id, error = %e, "refresh rejected, dropping stored token");
                    self.refresh_tokens.remove(&owner.id).await?;
                }
                return Err(e);
            }
        };

        self.refresh_tokens
            .store(&owner.id, &tokens.refresh_token)
            .await?;
        let identity = self.session.set_access_token(&tokens.access_token).await?;
        info!(user_id = %identity.id, "session refreshed");
        Ok((identity, tokens))
    }

    /// Revoke the user's refresh token (if one is held) and clear the session.
    ///
    /// A revoke the service rejects still signs the user out locally and the
    /// rejection is returned. Transport failures, timeouts and an open breaker
    /// leave the token and session in place so the call can be retried.
    pub async fn sign_out(&self, user_id: &str, correlation_id: Option<CorrelationId>) -> IamResult<()> {
        let mut rejected = None;
        if let Some(refresh_token) = self.refresh_tokens.retrieve(user_id).await? {
            match self
                .auth
                .revoke_token(&RevokeTokenRequest::new(refresh_token), correlation_id)
                .await
            {
                Ok(()) => {}
                Err(e @ IamError::RemoteActionFailed { .. }) => {
                    warn!(user_id, error = %e, "revoke rejected, forgetting refresh token");
                    rejected = Some(e);
                }
                Err(e) => return Err(e),
            }
            self.refresh_tokens.remove(user_id).await?;
        }

        if self
            .session
            .current_identity()
            .is_some_and(|identity| identity.id == user_id)
        {
            self.session.clear();
        }
        info!(user_id, "signed out");

        match rejected {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
