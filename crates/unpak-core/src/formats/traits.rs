//! Common trait for archive sources.

use crate::Result;
use crate::formats::entry::ArchiveEntry;

/// A seekable collection of chunked entries.
///
/// Implementations must allow [`read_chunk`](Self::read_chunk) to be called
/// from several threads at once; the extraction pipeline decodes chunks of
/// one entry in parallel.
pub trait ArchiveSource: Send + Sync {
    /// All entries in listing order. Paths are unique.
    fn entries(&self) -> &[ArchiveEntry];

    /// Reads, decodes and verifies one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExtractionError::InvalidArchive`] for corrupt or
    /// truncated data and I/O errors from the underlying storage.
    fn read_chunk(&self, entry: usize, chunk: usize) -> Result<Vec<u8>>;

    /// Short name of the source kind, for diagnostics.
    fn format_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionError;

    struct Empty;

    impl ArchiveSource for Empty {
        fn entries(&self) -> &[ArchiveEntry] {
            &[]
        }

        fn read_chunk(&self, entry: usize, chunk: usize) -> Result<Vec<u8>> {
            Err(ExtractionError::InvalidArchive(format!(
                "no chunk {chunk} in entry {entry}"
            )))
        }

        fn format_name(&self) -> &str {
            "empty"
        }
    }

    #[test]
    fn test_trait_object() {
        let source: Box<dyn ArchiveSource> = Box::new(Empty);
        assert!(source.entries().is_empty());
        assert_eq!(source.format_name(), "empty");
        assert!(source.read_chunk(0, 0).is_err());
    }
}
