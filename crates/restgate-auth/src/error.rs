//! Error types for query signature authentication.
//!
//! Every failure mode has its own [`AuthError`] variant so callers can log and
//! monitor them separately. All of them reject the request with `401`.

/// Errors that can occur while authenticating a signed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request carried no query string at all.
    #[error("Missing query string")]
    MissingQuery,

    /// Neither `username` nor `email` was supplied.
    #[error("Missing username or email")]
    MissingIdentity,

    /// The `timestamp` parameter is absent or not an integer.
    #[error("Missing or invalid timestamp")]
    MissingTimestamp,

    /// The `timestamp` lies outside the freshness window.
    #[error("Request has expired")]
    Expired,

    /// The `token` parameter is absent.
    #[error("Missing token")]
    MissingToken,

    /// The identity resolver does not know the supplied user.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// The supplied token does not match the computed signature.
    #[error("Signature does not match")]
    BadSignature,
}

impl AuthError {
    /// Returns the stable error code string for this failure.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingQuery => "MissingQuery",
            Self::MissingIdentity => "MissingIdentity",
            Self::MissingTimestamp => "MissingTimestamp",
            Self::Expired => "Expired",
            Self::MissingToken => "MissingToken",
            Self::UnknownUser(_) => "UnknownUser",
            Self::BadSignature => "BadSignature",
        }
    }

    /// Returns the HTTP status for this failure.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        http::StatusCode::UNAUTHORIZED
    }
}
