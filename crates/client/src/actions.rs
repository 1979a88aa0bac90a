//! Stable action tags understood by the remote IAM service.

/// Logical service name resolved through service discovery.
pub const SERVICE_NAME: &str = "iam";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthAction {
    GetJwks,
    Authenticate,
    CreateToken,
    RefreshToken,
    RevokeToken,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::GetJwks => "iam.auth.getJWKS",
            AuthAction::Authenticate => "iam.auth.authenticate",
            AuthAction::CreateToken => "iam.auth.createToken",
            AuthAction::RefreshToken => "iam.auth.refreshToken",
            AuthAction::RevokeToken => "iam.auth.revokeToken",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    GetUsers,
    GetUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::GetUsers => "iam.user.getUsers",
            UserAction::GetUser => "iam.user.getUser",
            UserAction::CreateUser => "iam.user.createUser",
            UserAction::UpdateUser => "iam.user.updateUser",
            UserAction::DeleteUser => "iam.user.deleteUser",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleAction {
    GetRoles,
    GetRole,
    CreateRole,
    UpdateRole,
    DeleteRole,
}

impl RoleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleAction::GetRoles => "iam.role.getRoles",
            RoleAction::GetRole => "iam.role.getRole",
            RoleAction::CreateRole => "iam.role.createRole",
            RoleAction::UpdateRole => "iam.role.updateRole",
            RoleAction::DeleteRole => "iam.role.deleteRole",
        }
    }
}

macro_rules! impl_display_as_tag {
    ($($t:ty),*) => {
        $(
            impl core::fmt::Display for $t {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display_as_tag!(AuthAction, UserAction, RoleAction);
