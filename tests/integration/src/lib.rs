//! Integration tests for the restgate server.
//!
//! These tests require a running `restgate-server` at `localhost:8080`,
//! started with a known secret and one seeded user:
//!
//! ```text
//! API_SECRET=integration-secret \
//! API_USERS=alice:alice@example.com:42 \
//! restgate-server
//! ```
//!
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p restgate-integration -- --ignored
//! ```
//!
//! `RESTGATE_ENDPOINT_URL` and `RESTGATE_SECRET` override the defaults.

use std::sync::Once;

use restgate_auth::sign_query;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("RESTGATE_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Shared secret the server was started with.
#[must_use]
pub fn secret() -> String {
    std::env::var("RESTGATE_SECRET").unwrap_or_else(|_| "integration-secret".to_owned())
}

/// Create an HTTP client.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Build `<endpoint><path>?<signed query>` for the seeded user, with `extra`
/// parameters included in the signature.
#[must_use]
pub fn signed_url(path: &str, extra: &[(&str, &str)]) -> String {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let mut pairs = vec![("username", "alice"), ("timestamp", timestamp.as_str())];
    pairs.extend_from_slice(extra);
    let query = sign_query(&pairs, secret().as_bytes());
    format!("{}{path}?{query}", endpoint_url())
}

/// Unique value for tests that write to the server.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("{prefix}-{id}")
}

mod test_auth;
mod test_dispatch;
mod test_service;
