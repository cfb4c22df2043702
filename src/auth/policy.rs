//! Access policy for catalog operations

use serde::Deserialize;

use crate::models::Role;

/// Set of roles allowed through a role check
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// What a caller must present to reach an operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// No token needed
    Public,
    /// Any valid token
    Authenticated,
    /// A valid token whose role is in the set
    Roles(RoleSet),
}

impl Access {
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Access::Roles(RoleSet::new(roles))
    }

    pub fn requires_identity(&self) -> bool {
        !matches!(self, Access::Public)
    }
}

/// Access required by each catalog operation.
///
/// Account registration and login are always public and not listed here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogPolicy {
    pub list_books: Access,
    pub get_book: Access,
    pub search_books: Access,
    pub create_book: Access,
    pub update_book: Access,
    pub delete_book: Access,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            list_books: Access::Public,
            get_book: Access::Public,
            search_books: Access::Public,
            create_book: Access::Authenticated,
            // Public by default; override with policy.update_book
            update_book: Access::Public,
            delete_book: Access::roles([Role::Librarian]),
        }
    }
}
