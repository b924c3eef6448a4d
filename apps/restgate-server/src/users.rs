//! Identity seeding from `API_USERS`.
//!
//! The variable holds comma-separated `username:email:id` triples, for example
//! `alice:alice@example.com:42,bob:bob@example.com:7`. Either the username or
//! the email may be left empty.

use anyhow::{Result, bail};
use restgate_auth::StaticIdentityResolver;
use restgate_core::Identity;

/// Build a resolver from an `API_USERS` value.
pub fn parse_users(value: &str) -> Result<StaticIdentityResolver> {
    let mut resolver = StaticIdentityResolver::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let fields: Vec<&str> = entry.split(':').map(str::trim).collect();
        let [username, email, id] = fields.as_slice() else {
            bail!("invalid API_USERS entry {entry:?}, expected username:email:id");
        };
        if id.is_empty() || (username.is_empty() && email.is_empty()) {
            bail!("invalid API_USERS entry {entry:?}, needs an id and a username or email");
        }

        let identity = Identity::new(*id);
        if !username.is_empty() {
            resolver = resolver.with_username(*username, identity.clone());
        }
        if !email.is_empty() {
            resolver = resolver.with_email(*email, identity);
        }
    }

    Ok(resolver)
}
