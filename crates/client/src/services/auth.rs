use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use iamgate_auth::{JwkSet, KeySetSource};
use iamgate_core::{CorrelationId, IamResult};
use iamgate_transport::{ActionDispatcher, MessageChannel, ServiceDiscovery};

use crate::actions::AuthAction;
use crate::config::IamClientConfig;
use crate::dto::{
    AuthenticateRequest, AuthenticateResponse, CreateTokenRequest, RefreshTokenRequest, RevokeTokenRequest,
    TokenPair,
};
use crate::fingerprint::{InboundRequest, MIN_FINGERPRINTS_TO_MATCH};

/// Token issuance and key-set retrieval.
pub struct AuthService {
    dispatcher: ActionDispatcher,
}

impl AuthService {
    pub const BREAKER_NAME: &'static str = "iam-auth";

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

    pub async fn get_jwks(&self, correlation_id: Option<CorrelationId>) -> IamResult<JwkSet> {
        self.dispatcher
            .send_as(AuthAction::GetJwks.as_str(), &serde_json::Map::new(), correlation_id)
            .await
    }

    /// Start a challenge; complete it with [`CreateTokenRequest::mfa`].
    pub async fn authenticate(
        &self,
        data: &AuthenticateRequest,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<AuthenticateResponse> {
        self.dispatcher
            .send_as(AuthAction::Authenticate.as_str(), data, correlation_id)
            .await
    }

    /// Issue a token pair, binding it to the fingerprints of `request`.
    pub async fn create_token(
        &self,
        mut data: CreateTokenRequest,
        request: Option<&InboundRequest>,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<TokenPair> {
        if let Some(request) = request {
            data.fingerprints = Some(request.fingerprints());
        }

        let pair = self
            .dispatcher
            .send_as(AuthAction::CreateToken.as_str(), &data, correlation_id)
            .await?;
        info!(fingerprinted = data.fingerprints.is_some(), "token pair issued");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// With a `request`, its fingerprints are attached and the service is asked
    /// to match at least [`MIN_FINGERPRINTS_TO_MATCH`] of them.
    pub async fn refresh_token(
        &self,
        mut data: RefreshTokenRequest,
        request: Option<&InboundRequest>,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<TokenPair> {
        if let Some(request) = request {
            data.fingerprints = Some(request.fingerprints());
            data.min_fingerprints_to_match = Some(MIN_FINGERPRINTS_TO_MATCH);
        }

        self.dispatcher
            .send_as(AuthAction::RefreshToken.as_str(), &data, correlation_id)
            .await
    }

    pub async fn revoke_token(
        &self,
        data: &RevokeTokenRequest,
        correlation_id: Option<CorrelationId>,
    ) -> IamResult<()> {
        self.dispatcher
            .send_unit(AuthAction::RevokeToken.as_str(), data, correlation_id)
            .await
    }
}

#[async_trait]
impl KeySetSource for AuthService {
    async fn fetch_key_set(&self) -> IamResult<JwkSet> {
        self.get_jwks(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    use http::{HeaderMap, HeaderValue};
    use serde_json::json;

    use iamgate_core::IamError;
    use iamgate_transport::{BreakerConfig, CircuitBreaker, LoopbackChannel, ServiceEndpoint};

    fn service(channel: Arc<LoopbackChannel>) -> AuthService {
        AuthService::new(ActionDispatcher::new(
            channel,
            ServiceEndpoint::new("iam.local", 8080),
            "http",
            CircuitBreaker::new(AuthService::BREAKER_NAME, BreakerConfig::default()),
        ))
    }

    fn browser() -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));
        InboundRequest::new(headers, Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 9))))
    }

    fn pair() -> serde_json::Value {
        json!({"access_token": "a", "refresh_token": "r"})
    }

    #[tokio::test]
    async fn create_token_attaches_fingerprints_only() {
        let channel = Arc::new(LoopbackChannel::new());
        channel.on_data("iam.auth.createToken", pair());
        let auth = service(channel.clone());

        let request = CreateTokenRequest::password("app", "secret", "ann@example.com", "pw");
        auth.create_token(request, Some(&browser()), None).await.unwrap();

        let sent = channel.sent();
        let data = sent[0].data();
        assert_eq!(data["fingerprints"], json!(["198.51.100.9", "Mozilla/5.0"]));
        assert!(data.get("min_fingerprints_to_match").is_none());
    }

    #[tokio::test]
    async fn refresh_token_requires_two_fingerprints() {
        let channel = Arc::new(LoopbackChannel::new());
        channel.on_data("iam.auth.refreshToken", pair());
        let auth = service(channel.clone());

        let tokens = auth
            .refresh_token(RefreshTokenRequest::new("r0"), Some(&browser()), None)
            .await
            .unwrap();
        assert_eq!(tokens.refresh_token, "r");

        let sent = channel.sent();
        assert_eq!(
            sent[0].data(),
            &json!({
                "refresh_token": "r0",
                "fingerprints": ["198.51.100.9", "Mozilla/5.0"],
                "min_fingerprints_to_match": 2
            })
        );
    }

    #[tokio::test]
    async fn refresh_without_request_sends_token_only() {
        let channel = Arc::new(LoopbackChannel::new());
        channel.on_data("iam.auth.refreshToken", pair());
        let auth = service(channel.clone());

        auth.refresh_token(RefreshTokenRequest::new("r0"), None, None)
            .await
            .unwrap();
        assert_eq!(channel.sent()[0].data(), &json!({"refresh_token": "r0"}));
    }

    #[tokio::test]
    async fn rejected_revoke_surfaces_remote_status() {
        let channel = Arc::new(LoopbackChannel::new());
        channel.on_status("iam.auth.revokeToken", 404, "unknown refresh token");
        let auth = service(channel);

        let err = auth
            .revoke_token(&RevokeTokenRequest::new("gone"), None)
            .await
            .unwrap_err();
        assert_eq!(err, IamError::remote(404, Some("unknown refresh token".into())));
    }

    #[tokio::test]
    async fn serves_as_key_set_source() {
        let channel = Arc::new(LoopbackChannel::new());
        channel.on_data(
            "iam.auth.getJWKS",
            json!({"keys": [{"kty": "OKP", "crv": "Ed25519", "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo", "kid": "k1"}]}),
        );
        let auth = service(channel.clone());

        let set = auth.fetch_key_set().await.unwrap();
        assert!(set.find("k1").is_some());
        assert_eq!(channel.calls("iam.auth.getJWKS"), 1);
    }
}
