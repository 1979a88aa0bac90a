//! Where refresh tokens live between sign-in and refresh.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use iamgate_core::IamResult;

/// Refresh tokens keyed by user id.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn retrieve(&self, user_id: &str) -> IamResult<Option<String>>;

    async fn store(&self, user_id: &str, refresh_token: &str) -> IamResult<()>;

    async fn remove(&self, user_id: &str) -> IamResult<()>;
}

/// Process-local store; tokens are lost on restart.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn retrieve(&self, user_id: &str) -> IamResult<Option<String>> {
        Ok(self
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned())
    }

    async fn store(&self, user_id: &str, refresh_token: &str) -> IamResult<()> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.to_string(), refresh_token.to_string());
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> IamResult<()> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);
        Ok(())
    }
}
