//! Archive listing types.

use std::fmt;
use std::path::PathBuf;

use crate::ExtractionError;
use crate::Result;
use crate::formats::compression::CompressionCodec;

/// Per-entry packing hints, carried through to the `.pakflags` manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackHints {
    /// Loader flags of the entry's chunks.
    pub load_flags: u32,
    /// Texture flags of the entry's chunks.
    pub texture_flags: u16,
}

impl PackHints {
    /// Creates hints from raw flag values.
    #[must_use]
    pub const fn new(load_flags: u32, texture_flags: u16) -> Self {
        Self {
            load_flags,
            texture_flags,
        }
    }
}

impl fmt::Display for PackHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x} 0x{:04x}", self.load_flags, self.texture_flags)
    }
}

/// Location and size of one independently decodable piece of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset of the stored data within its container.
    pub offset: u64,
    /// Stored (possibly compressed) size.
    pub compressed_size: u64,
    /// Size after decoding.
    pub uncompressed_size: u64,
    /// How the stored bytes are encoded.
    pub codec: CompressionCodec,
    /// CRC-32 of the decoded bytes, when the container records one.
    pub crc32: Option<u32>,
}

/// One file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Relative, forward-slash separated path.
    pub path: String,
    /// Packing hints recorded for this entry.
    pub hints: PackHints,
    /// Chunks in output order.
    pub chunks: Vec<Chunk>,
}

impl ArchiveEntry {
    /// Total decoded size, the sum of all chunk sizes.
    #[must_use]
    pub fn uncompressed_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.uncompressed_size).sum()
    }

    /// Total stored size.
    #[must_use]
    pub fn compressed_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.compressed_size).sum()
    }

    /// The entry path as a platform path relative to an output root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.path.split('/').collect()
    }
}

/// Checks that an entry path is safe to join onto an output root.
///
/// Paths must be non-empty, relative, use `/` as the only separator and
/// contain no control characters and no empty, `.` or `..` components.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidArchive`] describing the first problem.
pub fn validate_entry_path(path: &str) -> Result<()> {
    let reason = if path.is_empty() {
        Some("empty path")
    } else if path.chars().any(char::is_control) {
        Some("path contains a control character")
    } else if path.contains('\\') {
        Some("path contains a backslash")
    } else if path.starts_with('/') {
        Some("path is absolute")
    } else if path.split('/').any(|c| c.is_empty() || c == "." || c == "..") {
        Some("path has an empty, '.' or '..' component")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ExtractionError::InvalidArchive(format!(
            "entry {path:?}: {reason}"
        ))),
        None => Ok(()),
    }
}
