//! Dispatch error types.
//!
//! Every failure carries an [`ApiErrorCode`] and the HTTP status the caller
//! should answer with. Authentication failures keep the originating
//! [`AuthError`] as their source so the exact kind stays observable.

use std::fmt;

use restgate_auth::AuthError;

/// Well-known dispatch error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ApiErrorCode {
    /// The path names no registered resource.
    ResourceNotFound,
    /// The resource does not implement the requested verb.
    NotImplemented,
    /// A resource handler returned a descriptor without a controller.
    NoController,
    /// Authentication was required and failed.
    Unauthorized,
    /// Internal server error.
    InternalError,
}

impl ApiErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "ResourceNotFound",
            Self::NotImplemented => "NotImplemented",
            Self::NoController => "NoController",
            Self::Unauthorized => "Unauthorized",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::ResourceNotFound => http::StatusCode::NOT_FOUND,
            Self::NotImplemented => http::StatusCode::NOT_IMPLEMENTED,
            Self::Unauthorized => http::StatusCode::UNAUTHORIZED,
            Self::NoController | Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatch error.
#[derive(Debug)]
pub struct ApiError {
    /// The error code.
    pub code: ApiErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl ApiError {
    /// Create a new `ApiError` from an error code.
    #[must_use]
    pub fn new(code: ApiErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `ApiError` with a custom message.
    #[must_use]
    pub fn with_message(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The authentication failure behind an `Unauthorized` error.
    #[must_use]
    pub fn auth_error(&self) -> Option<&AuthError> {
        self.source.as_ref()?.downcast_ref::<AuthError>()
    }

    /// The code reported to clients. Authentication failures report their
    /// specific kind (e.g. `BadSignature`).
    #[must_use]
    pub fn client_code(&self) -> &'static str {
        self.auth_error().map_or(self.code.as_str(), AuthError::kind)
    }

    // -- Convenience constructors --

    /// No resource is registered under `resource`.
    #[must_use]
    pub fn resource_not_found(resource: &str) -> Self {
        Self::with_message(
            ApiErrorCode::ResourceNotFound,
            format!("Resource not found: {resource}"),
        )
    }

    /// `resource` does not implement `verb`.
    #[must_use]
    pub fn not_implemented(resource: &str, verb: &str) -> Self {
        Self::with_message(
            ApiErrorCode::NotImplemented,
            format!("{verb} is not implemented for resource {resource}"),
        )
    }

    /// The descriptor produced for `resource` names no controller.
    #[must_use]
    pub fn no_controller(resource: &str) -> Self {
        Self::with_message(
            ApiErrorCode::NoController,
            format!("No controller specified by resource {resource}"),
        )
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(ApiErrorCode::InternalError, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::with_message(ApiErrorCode::Unauthorized, err.to_string()).with_source(err)
    }
}
