//! Bearer-token verification against the cached signing-key set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use iamgate_core::{IamError, IamResult};

use crate::claims::{TokenClaims, validate_claims};
use crate::jwks::{KeySetCache, KeySetSource};
use crate::Identity;

/// Verification settings agreed with the issuing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// The single signature algorithm accepted.
    pub algorithm: Algorithm,
    /// Clock skew tolerated past `exp`.
    pub leeway_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::EdDSA,
            leeway_secs: 0,
        }
    }
}

impl VerifierConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

/// Turns bearer tokens into identities.
///
/// Holds no identity state itself; see [`crate::AuthSession`] for the cached
/// current identity.
pub struct IdentityVerifier {
    keys: KeySetCache,
    config: VerifierConfig,
}

impl IdentityVerifier {
    pub fn new(source: Arc<dyn KeySetSource>, config: VerifierConfig) -> Self {
        Self {
            keys: KeySetCache::new(source),
            config,
        }
    }

    pub fn keys(&self) -> &KeySetCache {
        &self.keys
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify `token` and return its embedded identity.
    ///
    /// Fails with `TokenExpired` for a correctly signed but expired token, and
    /// with `InvalidToken` for a bad signature, an unknown key id, or a missing
    /// or malformed `user` claim.
    pub async fn verify(&self, token: &str) -> IamResult<Identity> {
        self.verify_at(token, Utc::now()).await
    }

    pub async fn verify_at(&self, token: &str, now: DateTime<Utc>) -> IamResult<Identity> {
        let claims = self.decode_verified(token).await?;
        validate_claims(&claims, now, self.config.leeway_secs)?;
        claims.into_identity()
    }

    /// Best-effort identity lookup that tolerates expiry.
    ///
    /// Returns the embedded identity of any correctly signed token with a
    /// well-formed `user` claim, expired or not; `None` for every other failure.
    pub async fn resolve_expired_identity(&self, token: &str) -> Option<Identity> {
        match self.decode_verified(token).await.and_then(TokenClaims::into_identity) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "could not resolve identity from token");
                None
            }
        }
    }

    /// Check header and signature, and decode the claims. Expiry is not checked.
    async fn decode_verified(&self, token: &str) -> IamResult<TokenClaims> {
        let header = decode_header(token)
            .map_err(|e| IamError::invalid_token(format!("malformed token header: {e}")))?;

        if header.alg != self.config.algorithm {
            return Err(IamError::invalid_token(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header.kid.as_deref();
        let keys = self.keys.get().await?;
        let jwk = match select_key(&keys, kid) {
            Some(jwk) => jwk,
            None => {
                let Some(kid) = kid else {
                    return Err(IamError::invalid_token("token names no key id"));
                };
                debug!(kid, "unknown key id, refreshing signing key set");
                let fresh = self.keys.refresh(&keys).await?;
                select_key(&fresh, Some(kid)).ok_or_else(|| {
                    warn!(kid, "token signed with unknown key id");
                    IamError::invalid_token(format!("unknown key id '{kid}'"))
                })?
            }
        };

        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| IamError::invalid_token(format!("unusable signing key: {e}")))?;

        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
            debug!(kid, error = %e, "token rejected");
            IamError::invalid_token(e.to_string())
        })?;

        Ok(data.claims)
    }
}

/// Key named by `kid`; without a `kid`, only an unambiguous single-key set.
fn select_key(set: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
    match kid {
        Some(kid) => set.find(kid).cloned(),
        None if set.keys.len() == 1 => set.keys.first().cloned(),
        None => None,
    }
}
