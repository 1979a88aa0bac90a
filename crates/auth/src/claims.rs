use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use iamgate_core::{IamError, IamResult};

use crate::Identity;

/// Claims carried by an access token.
///
/// Only the claims the facade relies on are modelled; anything else the
/// issuer adds is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Embedded identity.
    #[serde(default)]
    pub user: Option<Identity>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Take the embedded identity, rejecting tokens without one.
    pub fn into_identity(self) -> IamResult<Identity> {
        self.user
            .ok_or_else(|| IamError::invalid_token("token carries no user claim"))
    }
}

/// Deterministically check the token's time window.
///
/// A token is usable only while `now < exp` (plus `leeway_secs`).
/// Signature verification happens before this, in the verifier.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>, leeway_secs: u64) -> IamResult<()> {
    let deadline = claims.exp.saturating_add(i64::try_from(leeway_secs).unwrap_or(i64::MAX));
    if now.timestamp() >= deadline {
        return Err(IamError::TokenExpired);
    }
    Ok(())
}
