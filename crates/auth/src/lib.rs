//! `iamgate-auth`: token verification and permission evaluation.
//!
//! Turns a bearer token into a verified [`Identity`] (signature checked against
//! a lazily fetched, cached signing-key set) and answers permission questions
//! from the cached claims without any network round trip.

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod jwks;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod verifier;

pub use authorize::{AuthzError, PermissionMatch, authorize, evaluate};
pub use claims::{TokenClaims, validate_claims};
pub use identity::Identity;
pub use jwks::{KeySetCache, KeySetSource};
pub use permissions::Permission;
pub use roles::Role;
pub use session::{AuthSession, IdentityStore};
pub use verifier::{IdentityVerifier, VerifierConfig};

pub use jsonwebtoken::Algorithm;
pub use jsonwebtoken::jwk::{Jwk, JwkSet};
