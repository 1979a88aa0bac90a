//! In-process stand-in for the IAM service.

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

use iamgate_client::{IamClient, IamClientConfig, InMemoryRefreshTokenStore};
use iamgate_transport::{LoopbackChannel, ServiceEndpoint, StaticDiscovery};

pub const KID: &str = "iam-2024";

const PKCS8_ED25519_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

pub struct FakeIam {
    pub channel: Arc<LoopbackChannel>,
    pub key: SigningKey,
}

impl FakeIam {
    /// Serves `getJWKS` and issues tokens for `user` on `createToken` and
    /// `refreshToken`.
    pub fn start(user: Value) -> Self {
        let key = SigningKey::from_bytes(&[42; 32]);
        let channel = Arc::new(LoopbackChannel::new());

        channel.on_data("iam.auth.getJWKS", jwks(&key));
        for action in ["iam.auth.createToken", "iam.auth.refreshToken"] {
            let key = key.clone();
            let user = user.clone();
            channel.on(action, move |req| {
                let generation = req.correlation_id().to_string();
                Ok(req.reply(json!({
                    "access_token": mint(&key, Duration::minutes(15), user.clone()),
                    "refresh_token": format!("refresh-{generation}"),
                })))
            });
        }
        channel.on_data("iam.auth.revokeToken", json!({}));

        Self { channel, key }
    }

    pub fn token(&self, user: Value, expires_in: Duration) -> String {
        mint(&self.key, expires_in, user)
    }

    pub async fn client(&self, store: Arc<InMemoryRefreshTokenStore>) -> IamClient {
        let discovery = StaticDiscovery::new().with_service("iam", ServiceEndpoint::new("iam.internal", 7000));
        IamClient::connect(&IamClientConfig::default(), &discovery, self.channel.clone(), store)
            .await
            .expect("connect")
    }
}

pub fn jwks(key: &SigningKey) -> Value {
    json!({"keys": [{
        "kty": "OKP",
        "crv": "Ed25519",
        "x": URL_SAFE_NO_PAD.encode(key.verifying_key().to_bytes()),
        "kid": KID,
        "alg": "EdDSA",
        "use": "sig"
    }]})
}

pub fn mint(key: &SigningKey, expires_in: Duration, user: Value) -> String {
    let mut der = PKCS8_ED25519_PREFIX.to_vec();
    der.extend_from_slice(&key.to_bytes());

    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(KID.to_string());
    let now = Utc::now();
    let claims = json!({
        "iat": now.timestamp(),
        "exp": (now + expires_in).timestamp(),
        "user": user,
    });
    encode(&header, &claims, &EncodingKey::from_ed_der(&der)).expect("mint token")
}

pub fn editor() -> Value {
    json!({
        "id": "u-100",
        "identities": ["eve@example.com"],
        "roles": [
            {"id": "r-read", "name": "reader", "permissions": ["post.read"]},
            {"id": "r-write", "name": "writer", "permissions": ["post.write"]}
        ],
        "meta": {}
    })
}
