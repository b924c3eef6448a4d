//! Gateway configuration.
//!
//! All configuration is driven by environment variables. The `API_*` variables
//! correspond to the `API.Secret`, `API.Expiration` and `API.AllowCORS` options
//! understood by existing API clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::GatewayError;

/// Settings that govern request signing and authentication.
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Shared HMAC key used to sign and verify requests.
    #[serde(skip_serializing, default)]
    #[builder(default, setter(into))]
    pub secret: String,

    /// Freshness window in seconds for the request `timestamp`.
    #[builder(default = 300)]
    pub expiration: u64,

    /// Whether responses carry CORS headers.
    #[builder(default = false)]
    pub allow_cors: bool,

    /// Value of the `persistent` flag handed to the session collaborator.
    #[builder(default = false)]
    pub persistent_session: bool,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("secret", &"[redacted]")
            .field("expiration", &self.expiration)
            .field("allow_cors", &self.allow_cors)
            .field("persistent_session", &self.persistent_session)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// What to do when an uploaded file name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Store under a fresh, unique name next to the requested one.
    #[default]
    Unique,
    /// Replace the existing file.
    Overwrite,
    /// Refuse the upload.
    Reject,
}

impl FromStr for ConflictPolicy {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unique" => Ok(Self::Unique),
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            other => Err(GatewayError::Config(format!(
                "unknown upload conflict policy: {other}"
            ))),
        }
    }
}

/// Global configuration for the gateway.
///
/// # Examples
///
/// ```
/// use restgate_core::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.api.expiration, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bind address for the gateway.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Authentication settings.
    #[builder(default)]
    pub api: ApiConfig,

    /// Directory that receives `userfile` uploads.
    #[builder(default = String::from("./uploads"))]
    pub upload_dir: String,

    /// Collision handling for uploads.
    #[builder(default)]
    pub upload_conflict: ConflictPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `API_SECRET` | *(empty)* |
    /// | `API_EXPIRATION` | `300` |
    /// | `API_ALLOW_CORS` | `false` |
    /// | `API_PERSISTENT_SESSION` | `false` |
    /// | `UPLOAD_DIR` | `./uploads` |
    /// | `UPLOAD_CONFLICT` | `unique` |
    ///
    /// Values that fail to parse keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("API_SECRET") {
            config.api.secret = v;
        }
        if let Ok(v) = std::env::var("API_EXPIRATION") {
            if let Ok(n) = v.parse::<u64>() {
                config.api.expiration = n;
            }
        }
        if let Ok(v) = std::env::var("API_ALLOW_CORS") {
            config.api.allow_cors = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("API_PERSISTENT_SESSION") {
            config.api.persistent_session = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("UPLOAD_DIR") {
            config.upload_dir = v;
        }
        if let Ok(v) = std::env::var("UPLOAD_CONFLICT") {
            if let Ok(policy) = v.parse() {
                config.upload_conflict = policy;
            }
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.gateway_listen, "0.0.0.0:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.api.secret.is_empty());
        assert_eq!(config.api.expiration, 300);
        assert!(!config.api.allow_cors);
        assert!(!config.api.persistent_session);
        assert_eq!(config.upload_dir, "./uploads");
        assert_eq!(config.upload_conflict, ConflictPolicy::Unique);
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = GatewayConfig::builder()
            .gateway_listen("127.0.0.1:9999".into())
            .api(
                ApiConfig::builder()
                    .secret("s3cr3t")
                    .expiration(60)
                    .allow_cors(true)
                    .build(),
            )
            .upload_conflict(ConflictPolicy::Reject)
            .build();

        assert_eq!(config.gateway_listen, "127.0.0.1:9999");
        assert_eq!(config.api.secret, "s3cr3t");
        assert_eq!(config.api.expiration, 60);
        assert!(config.api.allow_cors);
        assert_eq!(config.upload_conflict, ConflictPolicy::Reject);
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let api = ApiConfig::builder().secret("hunter2").build();
        let debug_str = format!("{api:?}");
        assert!(debug_str.contains("[redacted]"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_should_not_serialize_secret() {
        let config = GatewayConfig::builder()
            .api(ApiConfig::builder().secret("hunter2").build())
            .build();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("gatewayListen"));
        assert!(json.contains("allowCors"));
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_should_parse_conflict_policy() {
        assert_eq!("UNIQUE".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Unique);
        assert_eq!(
            "overwrite".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::Overwrite
        );
        assert_eq!("reject".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Reject);
        assert!("clobber".parse::<ConflictPolicy>().is_err());
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
