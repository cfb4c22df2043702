//! Authentication and authorization
//!
//! Password hashing, session tokens, the identity/role middleware pair and
//! the catalog access policy.

pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;

pub use middleware::{authenticate, authorize};
pub use password::PasswordHasher;
pub use policy::{Access, CatalogPolicy, RoleSet};
pub use token::{IssuedToken, TokenService};

use crate::models::Role;

/// Identity of the caller, attached to the request by [`authenticate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub account_id: i32,
    pub role: Role,
}
