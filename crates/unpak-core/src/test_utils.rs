//! Test utilities for building pak fixtures.
//!
//! # Panics
//!
//! All functions in this module may panic on encoder errors since they are
//! designed for test use only where panics are acceptable.

#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation
)]

use std::path::Path;

use crate::formats::compression::CompressionCodec;
use crate::formats::compression::crc32;
use crate::formats::entry::PackHints;
use crate::formats::pak::PAK_MAGIC;
use crate::formats::pak::PAK_VERSION;

struct PendingChunk {
    stored: Vec<u8>,
    uncompressed_size: u64,
    codec: CompressionCodec,
    crc32: u32,
}

struct PendingEntry {
    path: String,
    hints: PackHints,
    chunks: Vec<PendingChunk>,
}

/// Builder for in-memory pak archives.
///
/// `chunk_size`, `codec` and `hints` apply to files added after the call.
///
/// # Examples
///
/// ```
/// use unpak_core::formats::CompressionCodec;
/// use unpak_core::test_utils::PakBuilder;
///
/// let pak = PakBuilder::new()
///     .chunk_size(4)
///     .codec(CompressionCodec::Deflate)
///     .add_file("dir/file.txt", b"hello world")
///     .build();
/// assert_eq!(&pak[..4], b"UPAK");
/// ```
pub struct PakBuilder {
    entries: Vec<PendingEntry>,
    chunk_size: usize,
    codec: CompressionCodec,
    hints: PackHints,
}

impl Default for PakBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PakBuilder {
    /// Creates an empty builder: 64 KiB zstd chunks, default hints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            chunk_size: 64 * 1024,
            codec: CompressionCodec::Zstd,
            hints: PackHints::default(),
        }
    }

    /// Sets the chunk size for subsequent files.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sets the codec for subsequent files.
    #[must_use]
    pub fn codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the packing hints for subsequent files.
    #[must_use]
    pub fn hints(mut self, hints: PackHints) -> Self {
        self.hints = hints;
        self
    }

    /// Adds a file. The path is written verbatim, even if it is invalid.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        let chunks = data
            .chunks(self.chunk_size)
            .map(|piece| PendingChunk {
                stored: self.codec.compress(piece).unwrap(),
                uncompressed_size: piece.len() as u64,
                codec: self.codec,
                crc32: crc32(piece),
            })
            .collect();
        self.entries.push(PendingEntry {
            path: path.to_string(),
            hints: self.hints,
            chunks,
        });
        self
    }

    /// Records `size` as the decoded size of the first chunk of the most
    /// recently added file, whatever its data really decodes to.
    #[must_use]
    pub fn declare_size(mut self, size: u64) -> Self {
        let chunk = self
            .entries
            .last_mut()
            .and_then(|e| e.chunks.first_mut())
            .unwrap();
        chunk.uncompressed_size = size;
        self
    }

    /// Serializes the archive: index first, then chunk data in order.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let index_len: usize = 4
            + 2
            + 4
            + self
                .entries
                .iter()
                .map(|e| 2 + e.path.len() + 4 + 2 + 4 + e.chunks.len() * (8 + 8 + 8 + 1 + 4))
                .sum::<usize>();

        let mut index = Vec::with_capacity(index_len);
        let mut data = Vec::new();
        index.extend_from_slice(&PAK_MAGIC);
        index.extend_from_slice(&PAK_VERSION.to_le_bytes());
        index.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for entry in &self.entries {
            index.extend_from_slice(&(entry.path.len() as u16).to_le_bytes());
            index.extend_from_slice(entry.path.as_bytes());
            index.extend_from_slice(&entry.hints.load_flags.to_le_bytes());
            index.extend_from_slice(&entry.hints.texture_flags.to_le_bytes());
            index.extend_from_slice(&(entry.chunks.len() as u32).to_le_bytes());
            for chunk in &entry.chunks {
                let offset = (index_len + data.len()) as u64;
                index.extend_from_slice(&offset.to_le_bytes());
                index.extend_from_slice(&(chunk.stored.len() as u64).to_le_bytes());
                index.extend_from_slice(&chunk.uncompressed_size.to_le_bytes());
                index.push(chunk.codec.as_byte());
                index.extend_from_slice(&chunk.crc32.to_le_bytes());
                data.extend_from_slice(&chunk.stored);
            }
        }
        debug_assert_eq!(index.len(), index_len);
        index.extend_from_slice(&data);
        index
    }

    /// Serializes the archive to `path`.
    pub fn write_to(self, path: impl AsRef<Path>) {
        std::fs::write(path, self.build()).unwrap();
    }
}
