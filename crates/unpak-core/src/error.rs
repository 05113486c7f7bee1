//! Error types for archive extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur while unpacking an archive.
///
/// Every variant is fatal to the run that produced it; nothing in this crate
/// retries automatically.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A filesystem operation on a specific path failed.
    #[error("{op} {}: {source}", .path.display())]
    Filesystem {
        /// What was being done (e.g. "create directory").
        op: &'static str,
        /// The path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Source is neither a directory nor a recognized archive.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// Archive is corrupted or invalid.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// A filter or ignore pattern is not a valid glob.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern as written by the operator.
        pattern: String,
        /// Parser message.
        reason: String,
    },

    /// The output directory holds something the ignore manifest doesn't cover.
    #[error(
        "output directory {} must not exist or be empty (other than ignored files), found {name:?}",
        .path.display()
    )]
    DestinationNotEmpty {
        /// The output directory.
        path: PathBuf,
        /// First offending entry name.
        name: String,
    },

    /// An extracted file's final path already exists.
    #[error("destination already exists: {}", .path.display())]
    DestinationExists {
        /// The conflicting path.
        path: PathBuf,
    },

    /// A generated manifest does not describe the tree it was generated from.
    #[error("BUG: generated manifest failed validation: {reason}")]
    ManifestMismatch {
        /// What did not round-trip.
        reason: String,
        /// The manifest text that failed.
        manifest: String,
    },
}

impl ExtractionError {
    /// Returns `true` if this error was caused by operator input rather than
    /// by the archive or the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use unpak_core::ExtractionError;
    ///
    /// let err = ExtractionError::InvalidPattern {
    ///     pattern: "[".into(),
    ///     reason: "unclosed bracket".into(),
    /// };
    /// assert!(err.is_user_error());
    ///
    /// let err = ExtractionError::InvalidArchive("truncated chunk".into());
    /// assert!(!err.is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. } | Self::DestinationNotEmpty { .. } | Self::UnsupportedFormat
        )
    }

    /// Returns `true` if this error indicates a bug in this crate rather than
    /// bad input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::ManifestMismatch { .. })
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use unpak_core::ExtractionError;
    ///
    /// let err = ExtractionError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    ///
    /// let err = ExtractionError::UnsupportedFormat;
    /// assert_eq!(err.context(), None);
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::InvalidPattern { reason, .. } | Self::ManifestMismatch { reason, .. } => {
                Some(reason)
            }
            _ => None,
        }
    }

    pub(crate) fn fs(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::UnsupportedFormat;
        assert_eq!(err.to_string(), "unsupported archive format");
    }

    #[test]
    fn test_invalid_pattern_display() {
        let err = ExtractionError::InvalidPattern {
            pattern: "a[".into(),
            reason: "invalid range pattern".into(),
        };
        let display = err.to_string();
        assert!(display.contains("\"a[\""));
        assert!(display.contains("invalid range pattern"));
    }

    #[test]
    fn test_destination_not_empty_display() {
        let err = ExtractionError::DestinationNotEmpty {
            path: PathBuf::from("out"),
            name: "stray.txt".into(),
        };
        let display = err.to_string();
        assert!(display.contains("must not exist or be empty"));
        assert!(display.contains("stray.txt"));
        assert!(err.is_user_error());
        assert!(!err.is_internal());
    }

    #[test]
    fn test_filesystem_error_keeps_source() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExtractionError::fs("create directory", "out/a", io_err);
        assert!(err.to_string().starts_with("create directory out/a"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExtractionError = io_err.into();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[test]
    fn test_manifest_mismatch_is_internal() {
        let err = ExtractionError::ManifestMismatch {
            reason: "a/b resolved to 0x1".into(),
            manifest: "0x00000000 0x0000 /\n".into(),
        };
        assert!(err.is_internal());
        assert!(!err.is_user_error());
        assert!(err.to_string().starts_with("BUG:"));
        assert_eq!(err.context(), Some("a/b resolved to 0x1"));
    }
}
