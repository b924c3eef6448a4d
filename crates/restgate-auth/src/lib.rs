//! HMAC-SHA256 request authentication for restgate.
//!
//! Clients authenticate by appending three things to the query string: who
//! they are (`username` or `email`), when they signed (`timestamp`, unix
//! seconds), and a `token`. The token is the lower-case hex HMAC-SHA256, keyed
//! with the shared API secret, of every other parameter value joined in
//! key-sorted order.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use restgate_auth::{FixedClock, RequestAuthenticator, StaticIdentityResolver, sign_query};
//! use restgate_core::Identity;
//!
//! let resolver = StaticIdentityResolver::new()
//!     .with_user("alice", "alice@example.com", Identity::from(42));
//! let clock = FixedClock::new(1_700_000_000);
//!
//! let query = sign_query(
//!     &[("username", "alice"), ("timestamp", "1700000000")],
//!     b"secret",
//! );
//!
//! let authenticator =
//!     RequestAuthenticator::new(b"secret".to_vec(), 300, Arc::new(resolver), Arc::new(clock));
//! let identity = authenticator.authenticate(&query).unwrap();
//! assert_eq!(identity, Identity::from(42));
//! ```
//!
//! # Modules
//!
//! - [`authenticator`] - Credential extraction, freshness window and signature check
//! - [`clock`] - Injectable time source
//! - [`error`] - Authentication error kinds
//! - [`identity`] - Identity resolver trait and in-memory implementation
//! - [`params`] - Decoded request parameters and transport-key stripping
//! - [`signature`] - The canonical signature algorithm
//! - [`signer`] - Client-side helper producing signed query strings

pub mod authenticator;
pub mod clock;
pub mod error;
pub mod identity;
pub mod params;
pub mod signature;
pub mod signer;

pub use authenticator::{Credentials, RequestAuthenticator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::AuthError;
pub use identity::{IdentityResolver, StaticIdentityResolver};
pub use params::RequestParameters;
pub use signature::sign;
pub use signer::sign_query;
