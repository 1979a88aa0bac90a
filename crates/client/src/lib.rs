//! `iamgate-client`: action facades for the remote IAM service.
//!
//! One facade per resource (auth, user, role), each composed of an
//! [`ActionDispatcher`](iamgate_transport::ActionDispatcher) with its own
//! circuit breaker. [`IamClient`] wires them to an
//! [`AuthSession`](iamgate_auth::AuthSession) and a refresh-token store.

pub mod actions;
pub mod client;
pub mod config;
pub mod dto;
pub mod fingerprint;
pub mod services;
pub mod token_store;

pub use actions::{AuthAction, RoleAction, SERVICE_NAME, UserAction};
pub use client::IamClient;
pub use config::IamClientConfig;
pub use fingerprint::{InboundRequest, MIN_FINGERPRINTS_TO_MATCH};
pub use services::{AuthService, RoleService, UserService};
pub use token_store::{InMemoryRefreshTokenStore, RefreshTokenStore};
