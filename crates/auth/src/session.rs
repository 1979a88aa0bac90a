//! Current-identity cache.
//!
//! [`IdentityStore`] is a single shared slot with an interior lock. It is not
//! ordered against concurrent writers: when two `set_access_token` calls race,
//! the last write wins. Callers that need strict ordering serialize their own
//! calls.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use iamgate_core::IamResult;

use crate::authorize::{AuthzError, PermissionMatch, authorize, evaluate};
use crate::verifier::IdentityVerifier;
use crate::Identity;

#[derive(Clone)]
struct Current {
    identity: Arc<Identity>,
    access_token: String,
}

/// Holds the identity of the last successfully verified token.
#[derive(Default)]
pub struct IdentityStore {
    slot: RwLock<Option<Current>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, identity: Identity, access_token: impl Into<String>) -> Arc<Identity> {
        let identity = Arc::new(identity);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Current {
            identity: Arc::clone(&identity),
            access_token: access_token.into(),
        });
        identity
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.read(|c| Arc::clone(&c.identity))
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|c| c.access_token.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&Current) -> T) -> Option<T> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl core::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityStore")
            .field("identity", &self.identity().map(|i| i.id.clone()))
            .finish_non_exhaustive()
    }
}

/// Explicit session object: a verifier plus the identity it last established.
pub struct AuthSession {
    verifier: Arc<IdentityVerifier>,
    store: IdentityStore,
}

impl AuthSession {
    pub fn new(verifier: Arc<IdentityVerifier>) -> Self {
        Self {
            verifier,
            store: IdentityStore::new(),
        }
    }

    pub fn verifier(&self) -> &Arc<IdentityVerifier> {
        &self.verifier
    }

    /// Verify `token` and make its identity current.
    ///
    /// Any failure clears the current identity, so a previously valid identity
    /// never outlives a failed re-verification.
    pub async fn set_access_token(&self, token: &str) -> IamResult<Arc<Identity>> {
        match self.verifier.verify(token).await {
            Ok(identity) => {
                info!(user_id = %identity.id, roles = identity.roles.len(), "access token accepted");
                Ok(self.store.set(identity, token))
            }
            Err(e) => {
                self.store.clear();
                debug!(error = %e, "access token rejected, current identity cleared");
                Err(e)
            }
        }
    }

    pub fn current_identity(&self) -> Option<Arc<Identity>> {
        self.store.identity()
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.access_token()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Permission check against the current identity; false when there is none.
    pub fn can<P: AsRef<str>>(&self, permissions: &[P], mode: PermissionMatch) -> bool {
        if permissions.is_empty() {
            return true;
        }
        self.current_identity()
            .is_some_and(|identity| evaluate(&identity, permissions, mode))
    }

    pub fn authorize<P: AsRef<str>>(&self, permissions: &[P], mode: PermissionMatch) -> Result<(), AuthzError> {
        let identity = self.current_identity();
        authorize(identity.as_deref(), permissions, mode)
    }
}
