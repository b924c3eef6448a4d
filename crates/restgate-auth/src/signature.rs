//! The canonical request signature.
//!
//! ```text
//! StringToSign = lower(join("-", values sorted by key))
//! Signature    = hex(HMAC-SHA256(secret, StringToSign))
//! ```
//!
//! Only the values take part in the string to sign. Two parameter sets whose
//! sorted values coincide produce the same signature even when their keys
//! differ; existing clients depend on this exact construction, so it must not
//! be changed to include keys.

use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::params::RequestParameters;

type HmacSha256 = Hmac<Sha256>;

/// Delimiter placed between values in the string to sign.
pub const VALUE_DELIMITER: &str = "-";

/// Build the string to sign: the values in key order, joined with `-`, lower-cased.
///
/// The caller must already have removed the transport keys (see
/// [`RequestParameters::strip_transport_keys`]).
///
/// # Examples
///
/// ```
/// use restgate_auth::RequestParameters;
/// use restgate_auth::signature::build_string_to_sign;
///
/// let params = RequestParameters::parse("username=Alice&timestamp=1700000000");
/// assert_eq!(build_string_to_sign(&params), "1700000000-alice");
/// ```
#[must_use]
pub fn build_string_to_sign(params: &RequestParameters) -> String {
    params
        .values()
        .collect::<Vec<_>>()
        .join(VALUE_DELIMITER)
        .to_lowercase()
}

/// Compute the lower-case hex HMAC-SHA256 signature of `params` under `secret`.
#[must_use]
pub fn sign(params: &RequestParameters, secret: &[u8]) -> String {
    let string_to_sign = build_string_to_sign(params);
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can accept keys of any length");
    mac.update(string_to_sign.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
