//! Request/response payloads, one module per resource.

pub mod auth;
pub mod page;
pub mod role;
pub mod user;

pub use auth::{
    AuthenticateRequest, AuthenticateResponse, CreateTokenRequest, MfaCredentials, PasswordCredentials,
    RefreshTokenRequest, RevokeTokenRequest, TokenCredentials, TokenPair,
};
pub use page::{PageQuery, Paginated, SortOrder};
pub use role::{CreateRoleRequest, DeleteRoleRequest, RoleLookup, UpdateRoleRequest};
pub use user::{CreateUserRequest, DeleteUserRequest, UpdateUserRequest, UserLookup};
