use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Role;

/// Identity of an authenticated user, as embedded in the token's `user` claim.
///
/// Replaced wholesale on every successful verification; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,

    /// Login identifiers (email, username, ...).
    #[serde(default)]
    pub identities: Vec<String>,

    /// Ordered as issued by the remote service.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Opaque metadata, passed through untouched.
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            identities: Vec::new(),
            roles: Vec::new(),
            meta: Map::new(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identities.push(identity.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}
