use serde::{Deserialize, Serialize};

/// First step of a challenge flow; the service answers with a challenge id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub client_id: String,
    pub client_secret: String,
    pub identity: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub challenge_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Completes a challenge started by `authenticate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaCredentials {
    pub challenge_id: String,
    pub mfa_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenCredentials {
    Mfa(MfaCredentials),
    Password(PasswordCredentials),
}

/// Payload of `createToken`. Fingerprints are attached by the facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(flatten)]
    pub credentials: TokenCredentials,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprints: Option<Vec<String>>,
}

impl CreateTokenRequest {
    pub fn password(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        identity: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        TokenCredentials::Password(PasswordCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            identity: identity.into(),
            password: Some(password.into()),
        })
        .into()
    }

    pub fn mfa(challenge_id: impl Into<String>, mfa_code: impl Into<String>) -> Self {
        TokenCredentials::Mfa(MfaCredentials {
            challenge_id: challenge_id.into(),
            mfa_code: mfa_code.into(),
        })
        .into()
    }
}

impl From<TokenCredentials> for CreateTokenRequest {
    fn from(credentials: TokenCredentials) -> Self {
        Self {
            credentials,
            fingerprints: None,
        }
    }
}

/// Access/refresh token pair returned by `createToken` and `refreshToken`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprints: Option<Vec<String>>,

    /// How many of `fingerprints` the service must match against those
    /// recorded at issue time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fingerprints_to_match: Option<u32>,
}

impl RefreshTokenRequest {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            fingerprints: None,
            min_fingerprints_to_match: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeTokenRequest {
    pub refresh_token: String,
}

impl RevokeTokenRequest {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
        }
    }
}
