//! Signed query verification.
//!
//! [`RequestAuthenticator::authenticate`] runs the checks in a fixed order and
//! stops at the first failure:
//!
//! 1. The query string must be non-empty.
//! 2. Transport keys (`token`, `DeliveryType`, `DeliveryMethod`) are stripped.
//! 3. `username` or `email` must be present (`username` wins when both are).
//! 4. `timestamp` must be present and numeric.
//! 5. `|timestamp - now|` must not exceed the expiration window. Past and
//!    future skew are treated the same.
//! 6. `token` must be present.
//! 7. The user must resolve to an [`Identity`].
//! 8. `token` must equal the signature of the remaining parameters.
//!
//! The authenticator holds no session state; it only returns the identity.

use std::fmt;
use std::sync::Arc;

use restgate_core::Identity;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::identity::IdentityResolver;
use crate::params::{EMAIL, RequestParameters, TIMESTAMP, USERNAME};
use crate::signature::sign;

/// Who claims to have signed the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Identified by username.
    Username(String),
    /// Identified by email address.
    Email(String),
}

impl Principal {
    /// Pick the principal from request parameters. A non-empty `username`
    /// takes precedence; `email` is only consulted when it is absent.
    #[must_use]
    pub fn from_params(params: &RequestParameters) -> Option<Self> {
        let non_empty = |key| params.get(key).filter(|v| !v.is_empty());
        non_empty(USERNAME)
            .map(|u| Self::Username(u.to_owned()))
            .or_else(|| non_empty(EMAIL).map(|e| Self::Email(e.to_owned())))
    }

    /// The raw username or email.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Username(v) | Self::Email(v) => v,
        }
    }

    fn resolve(&self, resolver: &dyn IdentityResolver) -> Option<Identity> {
        match self {
            Self::Username(u) => resolver.resolve_by_username(u),
            Self::Email(e) => resolver.resolve_by_email(e),
        }
    }
}

/// The authentication material carried by a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The signing user.
    pub principal: Principal,
    /// Signing time, unix seconds.
    pub timestamp: i64,
    /// The client-supplied signature.
    pub token: String,
}

/// Verifies signed requests against a shared secret.
pub struct RequestAuthenticator {
    secret: Vec<u8>,
    expiration: u64,
    resolver: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("secret", &"[redacted]")
            .field("expiration", &self.expiration)
            .field("resolver", &"...")
            .finish_non_exhaustive()
    }
}

impl RequestAuthenticator {
    /// Create an authenticator.
    ///
    /// `expiration` is the freshness window in seconds.
    #[must_use]
    pub fn new(
        secret: impl Into<Vec<u8>>,
        expiration: u64,
        resolver: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secret: secret.into(),
            expiration,
            resolver,
            clock,
        }
    }

    /// The freshness window in seconds.
    #[must_use]
    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    /// Authenticate a raw query string.
    pub fn authenticate(&self, raw_query: &str) -> Result<Identity, AuthError> {
        let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);
        if raw_query.is_empty() {
            return Err(AuthError::MissingQuery);
        }
        self.authenticate_params(RequestParameters::parse(raw_query))
    }

    /// Authenticate already-decoded query parameters.
    pub fn authenticate_params(
        &self,
        mut params: RequestParameters,
    ) -> Result<Identity, AuthError> {
        if params.is_empty() {
            return Err(AuthError::MissingQuery);
        }

        let token = params.strip_transport_keys();
        let credentials = self.check_credentials(&params, token)?;

        debug!(
            principal = %credentials.principal.as_str(),
            timestamp = credentials.timestamp,
            "verifying signed request"
        );

        let identity = credentials
            .principal
            .resolve(self.resolver.as_ref())
            .ok_or_else(|| AuthError::UnknownUser(credentials.principal.as_str().to_owned()))?;

        let expected = sign(&params, &self.secret);
        if credentials
            .token
            .as_bytes()
            .ct_eq(expected.as_bytes())
            .into()
        {
            debug!(%identity, "signature verification succeeded");
            Ok(identity)
        } else {
            debug!(
                principal = %credentials.principal.as_str(),
                "signature mismatch"
            );
            Err(AuthError::BadSignature)
        }
    }

    /// Extract credentials and apply the freshness window, in check order.
    fn check_credentials(
        &self,
        params: &RequestParameters,
        token: Option<String>,
    ) -> Result<Credentials, AuthError> {
        let principal = Principal::from_params(params).ok_or(AuthError::MissingIdentity)?;

        let timestamp = params
            .get(TIMESTAMP)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(AuthError::MissingTimestamp)?;

        let now = self.clock.now();
        if timestamp.abs_diff(now) > self.expiration {
            debug!(timestamp, now, window = self.expiration, "timestamp outside window");
            return Err(AuthError::Expired);
        }

        let token = token.ok_or(AuthError::MissingToken)?;

        Ok(Credentials {
            principal,
            timestamp,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::identity::StaticIdentityResolver;
    use crate::signer::sign_query;

    const SECRET: &[u8] = b"test-secret";
    const NOW: i64 = 1_700_000_000;
    const WINDOW: u64 = 300;

    fn authenticator() -> RequestAuthenticator {
        let resolver = StaticIdentityResolver::new()
            .with_user("alice", "alice@example.com", Identity::from(42))
            .with_user("bob", "bob@example.com", Identity::from(7));
        RequestAuthenticator::new(
            SECRET,
            WINDOW,
            Arc::new(resolver),
            Arc::new(FixedClock::new(NOW)),
        )
    }

    fn signed(pairs: &[(&str, &str)]) -> String {
        sign_query(pairs, SECRET)
    }

    #[test]
    fn test_should_authenticate_valid_request() {
        let ts = NOW.to_string();
        let query = signed(&[("username", "alice"), ("timestamp", &ts)]);
        assert_eq!(authenticator().authenticate(&query), Ok(Identity::from(42)));
    }

    #[test]
    fn test_should_reject_token_off_by_one_character() {
        let ts = NOW.to_string();
        let query = signed(&[("username", "alice"), ("timestamp", &ts)]);
        let last = query.chars().last().unwrap();
        let replacement = if last == '0' { '1' } else { '0' };
        let tampered = format!("{}{replacement}", &query[..query.len() - 1]);
        assert_eq!(
            authenticator().authenticate(&tampered),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn test_should_reject_empty_query() {
        assert_eq!(authenticator().authenticate(""), Err(AuthError::MissingQuery));
        assert_eq!(authenticator().authenticate("?"), Err(AuthError::MissingQuery));
    }

    #[test]
    fn test_should_reject_missing_identity() {
        let query = format!("timestamp={NOW}&token=abc");
        assert_eq!(
            authenticator().authenticate(&query),
            Err(AuthError::MissingIdentity)
        );
    }

    #[test]
    fn test_should_treat_empty_username_as_missing() {
        let query = format!("username=&timestamp={NOW}&token=abc");
        assert_eq!(
            authenticator().authenticate(&query),
            Err(AuthError::MissingIdentity)
        );
    }

    #[test]
    fn test_should_reject_missing_timestamp() {
        assert_eq!(
            authenticator().authenticate("username=alice&token=abc"),
            Err(AuthError::MissingTimestamp)
        );
    }

    #[test]
    fn test_should_reject_non_numeric_timestamp() {
        assert_eq!(
            authenticator().authenticate("username=alice&timestamp=soon&token=abc"),
            Err(AuthError::MissingTimestamp)
        );
    }

    #[test]
    fn test_should_accept_timestamps_on_window_boundary() {
        for ts in [NOW - 300, NOW + 300] {
            let ts = ts.to_string();
            let query = signed(&[("username", "alice"), ("timestamp", &ts)]);
            assert_eq!(
                authenticator().authenticate(&query),
                Ok(Identity::from(42)),
                "timestamp {ts}"
            );
        }
    }

    #[test]
    fn test_should_reject_timestamps_past_window_in_both_directions() {
        for ts in [NOW - 301, NOW + 301] {
            let ts = ts.to_string();
            let query = signed(&[("username", "alice"), ("timestamp", &ts)]);
            assert_eq!(
                authenticator().authenticate(&query),
                Err(AuthError::Expired),
                "timestamp {ts}"
            );
        }
    }

    #[test]
    fn test_should_check_expiry_before_token_presence() {
        let query = format!("username=alice&timestamp={}", NOW - 10_000);
        assert_eq!(authenticator().authenticate(&query), Err(AuthError::Expired));
    }

    #[test]
    fn test_should_reject_missing_token() {
        let query = format!("username=alice&timestamp={NOW}");
        assert_eq!(
            authenticator().authenticate(&query),
            Err(AuthError::MissingToken)
        );
    }

    #[test]
    fn test_should_reject_unknown_user() {
        let ts = NOW.to_string();
        let query = signed(&[("username", "mallory"), ("timestamp", &ts)]);
        assert_eq!(
            authenticator().authenticate(&query),
            Err(AuthError::UnknownUser("mallory".to_owned()))
        );
    }

    #[test]
    fn test_should_prefer_username_over_email() {
        let ts = NOW.to_string();
        let query = signed(&[
            ("username", "alice"),
            ("email", "bob@example.com"),
            ("timestamp", &ts),
        ]);
        assert_eq!(authenticator().authenticate(&query), Ok(Identity::from(42)));
    }

    #[test]
    fn test_should_authenticate_by_email() {
        let ts = NOW.to_string();
        let query = signed(&[("email", "bob@example.com"), ("timestamp", &ts)]);
        assert_eq!(authenticator().authenticate(&query), Ok(Identity::from(7)));
    }

    #[test]
    fn test_should_ignore_delivery_hints_when_signing() {
        let ts = NOW.to_string();
        let query = signed(&[("username", "alice"), ("timestamp", &ts)]);
        let with_hints = format!("{query}&DeliveryType=DATA&DeliveryMethod=JSON");
        assert_eq!(
            authenticator().authenticate(&with_hints),
            Ok(Identity::from(42))
        );
    }

    #[test]
    fn test_should_sign_extra_parameters() {
        let ts = NOW.to_string();
        let query = signed(&[("username", "alice"), ("timestamp", &ts), ("page", "2")]);
        assert_eq!(authenticator().authenticate(&query), Ok(Identity::from(42)));

        let tampered = query.replace("page=2", "page=3");
        assert_eq!(
            authenticator().authenticate(&tampered),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn test_should_reject_signature_from_other_secret() {
        let ts = NOW.to_string();
        let query = sign_query(&[("username", "alice"), ("timestamp", &ts)], b"other");
        assert_eq!(
            authenticator().authenticate(&query),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn test_should_pick_principal_with_username_precedence() {
        let params = RequestParameters::parse("email=e@x.io&username=u");
        assert_eq!(
            Principal::from_params(&params),
            Some(Principal::Username("u".to_owned()))
        );
        let params = RequestParameters::parse("email=e@x.io");
        assert_eq!(
            Principal::from_params(&params),
            Some(Principal::Email("e@x.io".to_owned()))
        );
        assert_eq!(Principal::from_params(&RequestParameters::new()), None);
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let debug_str = format!("{:?}", authenticator());
        assert!(debug_str.contains("[redacted]"));
        assert!(!debug_str.contains("test-secret"));
    }
}
