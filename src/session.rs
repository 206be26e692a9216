//! Session flags read from the key-value store.
//!
//! A sign-in leaves an opaque token and a role string behind; the wizard only
//! ever reads them. [`sign_in`] and [`sign_out`] exist for the maintenance CLI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::store::{KeyValueStore, StoreError};

/// Store key holding the opaque auth token
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Store key holding the role string
pub const USER_ROLE_KEY: &str = "userRole";

/// Role attached to a signed-in session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    /// Moderation console access
    Admin,
    /// Registered listing owner
    User,
    /// Browsing-only account; also the fallback when no role is stored
    #[default]
    Seeker,
}

impl Role {
    /// Parse the stored role flag. Anything unrecognized is a seeker.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim() {
            "admin" => Role::Admin,
            "user" => Role::User,
            _ => Role::Seeker,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Seeker => "seeker",
        }
    }
}

/// Read-only view of the session flags, captured once at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    auth_token: Option<String>,
    role: Role,
}

impl Session {
    /// Capture the session flags from the store.
    ///
    /// Store failures are logged and read as "signed out".
    pub fn from_store(store: &dyn KeyValueStore) -> Self {
        let auth_token = match store.get(AUTH_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read auth token");
                None
            }
        };
        let role = match store.get(USER_ROLE_KEY) {
            Ok(Some(flag)) => Role::from_flag(&flag),
            Ok(None) => Role::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read user role");
                Role::default()
            }
        };

        Self { auth_token, role }
    }

    /// A signed-in session with the given token and role
    pub fn authenticated(token: impl Into<String>, role: Role) -> Self {
        Self {
            auth_token: Some(token.into()),
            role,
        }
    }

    /// A signed-out session
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.role == Role::Admin
    }
}

/// Write session flags; generates a `local-<uuid>` token when none is given.
///
/// Returns the token that was stored.
pub fn sign_in(
    store: &dyn KeyValueStore,
    token: Option<String>,
    role: Role,
) -> Result<String, StoreError> {
    let token = token.unwrap_or_else(|| format!("local-{}", Uuid::new_v4()));
    store.set(AUTH_TOKEN_KEY, &token)?;
    store.set(USER_ROLE_KEY, role.as_str())?;
    tracing::info!(role = role.as_str(), "Session flags written");
    Ok(token)
}

/// Remove both session flags
pub fn sign_out(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(AUTH_TOKEN_KEY)?;
    store.remove(USER_ROLE_KEY)?;
    tracing::info!("Session flags cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_empty_store_is_anonymous_seeker() {
        let store = MemoryStore::new();
        let session = Session::from_store(&store);
        assert!(!session.is_authenticated());
        assert_eq!(session.role(), Role::Seeker);
        assert_eq!(session, Session::anonymous());
    }

    #[test]
    fn test_reads_token_and_role() {
        let store = MemoryStore::with_entries([
            (AUTH_TOKEN_KEY, "mock-token-1"),
            (USER_ROLE_KEY, "admin"),
        ]);
        let session = Session::from_store(&store);
        assert_eq!(session.auth_token(), Some("mock-token-1"));
        assert!(session.is_admin());
    }

    #[test]
    fn test_blank_token_is_not_a_session() {
        let store = MemoryStore::with_entries([(AUTH_TOKEN_KEY, "  ")]);
        assert!(!Session::from_store(&store).is_authenticated());
    }

    #[test]
    fn test_admin_role_without_token_is_not_admin() {
        let store = MemoryStore::with_entries([(USER_ROLE_KEY, "admin")]);
        let session = Session::from_store(&store);
        assert_eq!(session.role(), Role::Admin);
        assert!(!session.is_admin());
    }

    #[test]
    fn test_role_from_flag() {
        assert_eq!(Role::from_flag("admin"), Role::Admin);
        assert_eq!(Role::from_flag("user"), Role::User);
        assert_eq!(Role::from_flag("landlord"), Role::Seeker);
    }

    #[test]
    fn test_sign_in_then_out() {
        let store = MemoryStore::new();
        let token = sign_in(&store, None, Role::User).unwrap();
        assert!(token.starts_with("local-"));

        let session = Session::from_store(&store);
        assert_eq!(session.auth_token(), Some(token.as_str()));
        assert_eq!(session.role(), Role::User);

        sign_out(&store).unwrap();
        assert!(!Session::from_store(&store).is_authenticated());
    }
}
