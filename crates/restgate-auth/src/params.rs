//! Decoded request parameters.
//!
//! [`RequestParameters`] is the key-sorted view of a query string that the
//! signature is computed over. Keys are unique: when a key repeats, the last
//! occurrence wins.

use std::collections::BTreeMap;

/// Query key carrying the client signature.
pub const TOKEN: &str = "token";
/// Query key naming the signing user.
pub const USERNAME: &str = "username";
/// Query key naming the signing user by email.
pub const EMAIL: &str = "email";
/// Query key carrying the signing time in unix seconds.
pub const TIMESTAMP: &str = "timestamp";

/// Keys consumed by the transport that never take part in signing.
pub const TRANSPORT_KEYS: &[&str] = &[TOKEN, "DeliveryType", "DeliveryMethod"];

/// Request parameters ordered by key (ordinal byte comparison).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    inner: BTreeMap<String, String>,
}

impl RequestParameters {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use restgate_auth::RequestParameters;
    ///
    /// let params = RequestParameters::parse("?b=2&a=hello%20world");
    /// assert_eq!(params.get("a"), Some("hello world"));
    /// assert_eq!(params.values().collect::<Vec<_>>(), vec!["hello world", "2"]);
    /// ```
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Insert a parameter, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(key)
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    /// Whether a parameter is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Remove the transport-control keys (`token` and the delivery hints),
    /// returning the stripped token if there was one.
    pub fn strip_transport_keys(&mut self) -> Option<String> {
        let token = self.inner.remove(TOKEN);
        for key in TRANSPORT_KEYS.iter().skip(1) {
            self.inner.remove(*key);
        }
        token
    }

    /// Iterate over values in key order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.inner.values().map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl IntoIterator for RequestParameters {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
