//! Storage for files submitted through the reserved `userfile` field.
//!
//! Client-supplied names are validated before anything touches the
//! filesystem: path separators, `..`, NUL bytes and empty names are refused.
//! Name collisions are resolved by the configured [`ConflictPolicy`].

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use restgate_core::ConflictPolicy;
use tracing::debug;

/// Errors raised while storing an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The client-supplied file name is not a plain file name.
    #[error("invalid upload filename: {0:?}")]
    InvalidFilename(String),

    /// A file with this name exists and the policy forbids replacing it.
    #[error("upload target already exists: {0}")]
    AlreadyExists(String),

    /// The write itself failed.
    #[error("upload I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Destination for uploaded file content.
pub trait UploadStore: Send + Sync {
    /// Persist `content` under `filename`, returning where it was written.
    fn store(&self, filename: &str, content: &[u8]) -> Result<PathBuf, UploadError>;
}

/// Writes uploads into a single directory.
#[derive(Debug, Clone)]
pub struct DirectoryUploadStore {
    root: PathBuf,
    policy: ConflictPolicy,
}

impl DirectoryUploadStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, policy: ConflictPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    /// The directory uploads are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unique_name(filename: &str) -> String {
        let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
        match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{suffix}.{ext}"),
            _ => format!("{filename}-{suffix}"),
        }
    }
}

impl UploadStore for DirectoryUploadStore {
    fn store(&self, filename: &str, content: &[u8]) -> Result<PathBuf, UploadError> {
        validate_filename(filename)?;
        fs::create_dir_all(&self.root)?;

        let mut target = self.root.join(filename);
        let mut options = OpenOptions::new();
        options.write(true);

        match self.policy {
            ConflictPolicy::Overwrite => {
                options.create(true).truncate(true);
            }
            ConflictPolicy::Reject => {
                options.create_new(true);
            }
            ConflictPolicy::Unique => {
                if target.exists() {
                    target = self.root.join(Self::unique_name(filename));
                }
                options.create_new(true);
            }
        }

        let mut file = options.open(&target).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                UploadError::AlreadyExists(filename.to_owned())
            } else {
                UploadError::Io(e)
            }
        })?;
        file.write_all(content)?;

        debug!(path = %target.display(), bytes = content.len(), "stored upload");
        Ok(target)
    }
}

/// Reject anything that is not a plain file name.
///
/// # Examples
///
/// ```
/// use restgate_http::upload::validate_filename;
///
/// assert!(validate_filename("avatar.png").is_ok());
/// assert!(validate_filename("../etc/passwd").is_err());
/// ```
pub fn validate_filename(filename: &str) -> Result<(), UploadError> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0'])
        || filename.contains("..")
        || Path::new(filename).is_absolute();
    if invalid {
        return Err(UploadError::InvalidFilename(filename.to_owned()));
    }
    Ok(())
}
