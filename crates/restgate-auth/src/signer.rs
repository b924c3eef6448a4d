//! Client-side helper for producing signed query strings.

use crate::params::{RequestParameters, TOKEN};
use crate::signature::sign;

/// Encode `pairs` as a query string and append the matching `token`.
///
/// Transport keys present in `pairs` are kept in the output but excluded from
/// the signature, mirroring what the server strips before verifying. Any
/// `token` already in `pairs` is dropped.
///
/// # Examples
///
/// ```
/// use restgate_auth::sign_query;
///
/// let query = sign_query(&[("username", "alice"), ("timestamp", "1700000000")], b"secret");
/// assert!(query.starts_with("username=alice&timestamp=1700000000&token="));
/// ```
#[must_use]
pub fn sign_query(pairs: &[(&str, &str)], secret: &[u8]) -> String {
    let mut params: RequestParameters = pairs.iter().copied().collect();
    params.strip_transport_keys();
    let token = sign(&params, secret);

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs.iter().filter(|(k, _)| *k != TOKEN) {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(TOKEN, &token);
    serializer.finish()
}
