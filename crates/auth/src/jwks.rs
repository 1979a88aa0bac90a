//! Signing-key set retrieval and caching.
//!
//! The key set is fetched lazily on first use and then reused for the life of
//! the process. Fills are single-flight: concurrent verifiers that miss the
//! cache wait on the one in-flight fetch and share its result.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::RwLock;
use tracing::info;

use iamgate_core::IamResult;

/// Supplies the current signing-key set (normally the remote IAM service).
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch_key_set(&self) -> IamResult<JwkSet>;
}

#[async_trait]
impl<S> KeySetSource for Arc<S>
where
    S: KeySetSource + ?Sized,
{
    async fn fetch_key_set(&self) -> IamResult<JwkSet> {
        (**self).fetch_key_set().await
    }
}

/// Once-filled cache cell for the signing-key set.
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    cached: RwLock<Option<Arc<JwkSet>>>,
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Cached key set, fetching it on first use.
    ///
    /// A failed fetch leaves the cell empty; the next call tries again.
    pub async fn get(&self) -> IamResult<Arc<JwkSet>> {
        {
            let cached = self.cached.read().await;
            if let Some(set) = cached.as_ref() {
                return Ok(Arc::clone(set));
            }
        }

        let mut slot = self.cached.write().await;
        // Filled by another caller while we waited for the write lock.
        if let Some(set) = slot.as_ref() {
            return Ok(Arc::clone(set));
        }

        let set = self.fetch().await?;
        *slot = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Replace `stale` with a freshly fetched set.
    ///
    /// If another caller already replaced `stale`, its result is returned and
    /// no second fetch is made.
    pub async fn refresh(&self, stale: &Arc<JwkSet>) -> IamResult<Arc<JwkSet>> {
        let mut slot = self.cached.write().await;
        if let Some(current) = slot.as_ref() {
            if !Arc::ptr_eq(current, stale) {
                return Ok(Arc::clone(current));
            }
        }

        let set = self.fetch().await?;
        *slot = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Drop the cached set; the next `get` fetches again.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub async fn cached(&self) -> Option<Arc<JwkSet>> {
        self.cached.read().await.clone()
    }

    async fn fetch(&self) -> IamResult<Arc<JwkSet>> {
        let set = self.source.fetch_key_set().await?;
        info!(keys = set.keys.len(), "fetched signing key set");
        Ok(Arc::new(set))
    }
}
