//! Identity resolver trait and implementations.
//!
//! User records live outside the gateway. [`IdentityResolver`] is the seam
//! through which the authenticator looks up the stable identifier for a
//! username or email. [`StaticIdentityResolver`] is an in-memory
//! implementation for tests and development.

use std::collections::HashMap;

use restgate_core::Identity;

/// Trait for resolving a username or email to a stable user identifier.
///
/// Implementations may back this with a database or directory service. The
/// call may be slow; the gateway applies no timeout or retry of its own.
pub trait IdentityResolver: Send + Sync {
    /// Look up a user by username.
    fn resolve_by_username(&self, username: &str) -> Option<Identity>;

    /// Look up a user by email address.
    fn resolve_by_email(&self, email: &str) -> Option<Identity>;
}

/// A simple in-memory identity resolver backed by two `HashMap`s.
///
/// # Examples
///
/// ```
/// use restgate_auth::{IdentityResolver, StaticIdentityResolver};
/// use restgate_core::Identity;
///
/// let resolver = StaticIdentityResolver::new()
///     .with_user("alice", "alice@example.com", Identity::from(42));
///
/// assert_eq!(resolver.resolve_by_username("alice"), Some(Identity::from(42)));
/// assert_eq!(resolver.resolve_by_email("alice@example.com"), Some(Identity::from(42)));
/// assert_eq!(resolver.resolve_by_username("bob"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    by_username: HashMap<String, Identity>,
    by_email: HashMap<String, Identity>,
}

impl StaticIdentityResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user reachable by both username and email.
    #[must_use]
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        email: impl Into<String>,
        identity: Identity,
    ) -> Self {
        self.by_username.insert(username.into(), identity.clone());
        self.by_email.insert(email.into(), identity);
        self
    }

    /// Register a username only.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>, identity: Identity) -> Self {
        self.by_username.insert(username.into(), identity);
        self
    }

    /// Register an email only.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, identity: Identity) -> Self {
        self.by_email.insert(email.into(), identity);
        self
    }

    /// Number of distinct usernames and emails known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_username.len() + self.by_email.len()
    }

    /// Whether no users are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty() && self.by_email.is_empty()
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve_by_username(&self, username: &str) -> Option<Identity> {
        self.by_username.get(username).cloned()
    }

    fn resolve_by_email(&self, email: &str) -> Option<Identity> {
        self.by_email.get(email).cloned()
    }
}
