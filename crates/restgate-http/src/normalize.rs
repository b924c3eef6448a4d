//! Body normalization for PUT and DELETE requests.
//!
//! Many transports only decode form bodies for POST. [`BodyNormalizer`] turns a
//! raw URL-encoded or multipart body into the same flat field map a POST would
//! have produced.
//!
//! In multipart bodies, a part named `userfile` that carries a `filename` is
//! written to the [`UploadStore`] and reported in
//! [`NormalizedBody::uploads`] instead of the field map. Normalization never
//! fails: malformed parts and rejected uploads are logged and dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::multipart::{detect_boundary, parse_parts};
use crate::upload::UploadStore;

/// The reserved multipart field that carries an uploaded file.
pub const UPLOAD_FIELD: &str = "userfile";

/// A file written during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    /// Multipart field name.
    pub field: String,
    /// File name as sent by the client.
    pub filename: String,
    /// Where the content was written.
    pub path: PathBuf,
}

/// Decoded body fields plus any upload side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBody {
    /// Field name to value.
    pub fields: BTreeMap<String, String>,
    /// Files written to the upload store.
    pub uploads: Vec<StoredUpload>,
}

/// Decodes raw request bodies into [`NormalizedBody`] values.
#[derive(Clone)]
pub struct BodyNormalizer {
    uploads: Option<Arc<dyn UploadStore>>,
}

impl fmt::Debug for BodyNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyNormalizer")
            .field("uploads", &self.uploads.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Default for BodyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyNormalizer {
    /// A normalizer without upload storage. `userfile` parts are dropped.
    #[must_use]
    pub fn new() -> Self {
        Self { uploads: None }
    }

    /// A normalizer that writes `userfile` parts to `store`.
    #[must_use]
    pub fn with_upload_store(store: Arc<dyn UploadStore>) -> Self {
        Self {
            uploads: Some(store),
        }
    }

    /// Decode `body`, using `content_type` as a hint for the multipart boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use restgate_http::BodyNormalizer;
    ///
    /// let body = BodyNormalizer::new().normalize(b"a=1&b=2", None);
    /// assert_eq!(body.fields.get("a").map(String::as_str), Some("1"));
    /// assert_eq!(body.fields.get("b").map(String::as_str), Some("2"));
    /// ```
    #[must_use]
    pub fn normalize(&self, body: &[u8], content_type: Option<&str>) -> NormalizedBody {
        match detect_boundary(body, content_type) {
            Some(boundary) => self.normalize_multipart(body, boundary),
            None => NormalizedBody {
                fields: parse_urlencoded(body),
                uploads: Vec::new(),
            },
        }
    }

    fn normalize_multipart(&self, body: &[u8], boundary: &[u8]) -> NormalizedBody {
        let mut normalized = NormalizedBody::default();

        for part in parse_parts(body, boundary) {
            match part.filename {
                Some(filename) if part.name == UPLOAD_FIELD => {
                    if let Some(upload) = self.store_upload(&part.name, filename, part.content) {
                        normalized.uploads.push(upload);
                    }
                }
                _ => {
                    let value = String::from_utf8_lossy(part.content).into_owned();
                    normalized.fields.insert(part.name, value);
                }
            }
        }

        debug!(
            fields = normalized.fields.len(),
            uploads = normalized.uploads.len(),
            "normalized multipart body"
        );
        normalized
    }

    fn store_upload(&self, field: &str, filename: String, content: &[u8]) -> Option<StoredUpload> {
        let Some(store) = self.uploads.as_ref() else {
            warn!(filename = %filename, "dropping upload, no upload store configured");
            return None;
        };
        match store.store(&filename, content) {
            Ok(path) => Some(StoredUpload {
                field: field.to_owned(),
                filename,
                path,
            }),
            Err(e) => {
                warn!(filename = %filename, error = %e, "dropping upload");
                None
            }
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` body. Segments without `=`
/// are ignored; repeated keys keep the last value.
fn parse_urlencoded(body: &[u8]) -> BTreeMap<String, String> {
    body.split(|b| *b == b'&')
        .filter(|segment| segment.contains(&b'='))
        .filter_map(|segment| form_urlencoded::parse(segment).into_owned().next())
        .collect()
}
