//! Reader for single-file chunked pak archives.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "UPAK" | u16 version | u32 entry count
//! per entry:  u16 path length | path (UTF-8) | u32 load flags | u16 texture flags | u32 chunk count
//! per chunk:  u64 offset | u64 stored size | u64 decoded size | u8 codec | u32 crc32
//! ```
//!
//! Chunk data may live anywhere in the file after the index; offsets are
//! absolute.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use tracing::debug;

use crate::ExtractionError;
use crate::Result;
use crate::formats::compression::CompressionCodec;
use crate::formats::compression::crc32;
use crate::formats::entry::ArchiveEntry;
use crate::formats::entry::Chunk;
use crate::formats::entry::PackHints;
use crate::formats::entry::validate_entry_path;
use crate::formats::traits::ArchiveSource;

/// File signature of a pak archive.
pub const PAK_MAGIC: [u8; 4] = *b"UPAK";

/// The only index version this reader understands.
pub const PAK_VERSION: u16 = 1;

/// Largest decoded size accepted for a single chunk.
pub const MAX_CHUNK_SIZE: u64 = 256 * 1024 * 1024;

/// An open pak archive.
///
/// The index is parsed eagerly; chunk data is read on demand. Reads from
/// several threads are serialized on the file handle while decoding runs
/// in parallel.
#[derive(Debug)]
pub struct PakArchive {
    path: PathBuf,
    file: Mutex<File>,
    entries: Vec<ArchiveEntry>,
}

impl PakArchive {
    /// Opens `path` and parses its index.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened and
    /// [`ExtractionError::InvalidArchive`] if the index is malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| ExtractionError::fs("open archive", path, e))?;
        let file_len = file.metadata()?.len();
        let entries = parse_index(BufReader::new(&file), file_len)?;
        debug!(path = %path.display(), entries = entries.len(), "opened pak archive");
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            entries,
        })
    }

    /// Path the archive was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_stored(&self, chunk: &Chunk) -> Result<Vec<u8>> {
        let len = to_usize(chunk.compressed_size)?;
        let mut buf = vec![0u8; len];
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start(chunk.offset))?;
        file.read_exact(&mut buf).map_err(truncated("chunk data"))?;
        Ok(buf)
    }
}

impl ArchiveSource for PakArchive {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_chunk(&self, entry: usize, chunk: usize) -> Result<Vec<u8>> {
        let entry = self.entries.get(entry).ok_or_else(|| {
            ExtractionError::InvalidArchive(format!("entry index {entry} out of range"))
        })?;
        let info = entry.chunks.get(chunk).ok_or_else(|| {
            ExtractionError::InvalidArchive(format!("{}: chunk {chunk} out of range", entry.path))
        })?;

        let stored = self.read_stored(info)?;
        let expected = to_usize(info.uncompressed_size)?;
        let data = info.codec.decompress(&stored, expected).map_err(|e| {
            ExtractionError::InvalidArchive(format!(
                "{}: chunk {chunk}: {} decode failed: {e}",
                entry.path,
                info.codec.name()
            ))
        })?;
        if data.len() != expected {
            return Err(ExtractionError::InvalidArchive(format!(
                "{}: chunk {chunk}: decoded {} bytes, expected {expected}",
                entry.path,
                data.len()
            )));
        }
        if let Some(want) = info.crc32
            && crc32(&data) != want
        {
            return Err(ExtractionError::InvalidArchive(format!(
                "{}: chunk {chunk}: checksum mismatch",
                entry.path
            )));
        }
        Ok(data)
    }

    fn format_name(&self) -> &str {
        "pak"
    }
}

fn parse_index<R: Read>(reader: R, file_len: u64) -> Result<Vec<ArchiveEntry>> {
    let mut r = IndexReader(reader);

    if r.array::<4>()? != PAK_MAGIC {
        return Err(ExtractionError::InvalidArchive("bad magic".into()));
    }
    let version = r.u16()?;
    if version != PAK_VERSION {
        return Err(ExtractionError::InvalidArchive(format!(
            "unsupported index version {version}"
        )));
    }

    let count = r.u32()?;
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    for _ in 0..count {
        let path_len = usize::from(r.u16()?);
        let path = String::from_utf8(r.bytes(path_len)?)
            .map_err(|_| ExtractionError::InvalidArchive("entry path is not UTF-8".into()))?;
        validate_entry_path(&path)?;
        if !seen.insert(path.clone()) {
            return Err(ExtractionError::InvalidArchive(format!(
                "duplicate entry {path:?}"
            )));
        }

        let hints = PackHints::new(r.u32()?, r.u16()?);
        let chunk_count = r.u32()?;
        let mut chunks = Vec::new();
        for index in 0..chunk_count {
            let chunk = Chunk {
                offset: r.u64()?,
                compressed_size: r.u64()?,
                uncompressed_size: r.u64()?,
                codec: {
                    let byte = r.u8()?;
                    CompressionCodec::from_byte(byte).ok_or_else(|| {
                        ExtractionError::InvalidArchive(format!(
                            "{path}: chunk {index}: unknown codec {byte}"
                        ))
                    })?
                },
                crc32: Some(r.u32()?),
            };
            check_chunk(&path, index, &chunk, file_len)?;
            chunks.push(chunk);
        }
        entries.push(ArchiveEntry {
            path,
            hints,
            chunks,
        });
    }
    Ok(entries)
}

fn check_chunk(path: &str, index: u32, chunk: &Chunk, file_len: u64) -> Result<()> {
    let in_bounds = chunk
        .offset
        .checked_add(chunk.compressed_size)
        .is_some_and(|end| end <= file_len);
    if !in_bounds {
        return Err(ExtractionError::InvalidArchive(format!(
            "{path}: chunk {index}: data lies outside the archive"
        )));
    }
    if chunk.uncompressed_size > MAX_CHUNK_SIZE {
        return Err(ExtractionError::InvalidArchive(format!(
            "{path}: chunk {index}: decoded size {} exceeds the {MAX_CHUNK_SIZE} byte limit",
            chunk.uncompressed_size
        )));
    }
    if chunk.codec == CompressionCodec::Stored && chunk.compressed_size != chunk.uncompressed_size
    {
        return Err(ExtractionError::InvalidArchive(format!(
            "{path}: chunk {index}: stored chunk sizes differ"
        )));
    }
    Ok(())
}

fn to_usize(n: u64) -> Result<usize> {
    usize::try_from(n)
        .map_err(|_| ExtractionError::InvalidArchive(format!("chunk size {n} too large")))
}

fn truncated(what: &'static str) -> impl Fn(io::Error) -> ExtractionError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ExtractionError::InvalidArchive(format!("truncated {what}"))
        } else {
            ExtractionError::Io(e)
        }
    }
}

struct IndexReader<R>(R);

impl<R: Read> IndexReader<R> {
    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.0.read_exact(&mut buf).map_err(truncated("index"))?;
        Ok(buf)
    }

    fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.0.read_exact(&mut buf).map_err(truncated("index"))?;
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64> {
        self.array().map(u64::from_le_bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::PakBuilder;
    use tempfile::TempDir;

    fn write_pak(dir: &TempDir, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join("test.pak");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_open_and_read_all_codecs() {
        let temp = TempDir::new().unwrap();
        let data = b"0123456789".repeat(50);
        let bytes = PakBuilder::new()
            .chunk_size(64)
            .codec(CompressionCodec::Zstd)
            .add_file("z/zstd.bin", &data)
            .codec(CompressionCodec::Deflate)
            .add_file("d/deflate.bin", &data)
            .codec(CompressionCodec::Stored)
            .add_file("stored.bin", &data)
            .build();
        let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();

        assert_eq!(pak.format_name(), "pak");
        assert_eq!(pak.entries().len(), 3);
        for (i, entry) in pak.entries().iter().enumerate() {
            assert_eq!(entry.chunks.len(), 8, "{}", entry.path);
            assert_eq!(entry.uncompressed_size(), 500);
            let mut out = Vec::new();
            for c in 0..entry.chunks.len() {
                out.extend(pak.read_chunk(i, c).unwrap());
            }
            assert_eq!(out, data);
        }
    }

    #[test]
    fn test_hints_are_parsed() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new()
            .hints(PackHints::new(0x101, 0x8))
            .add_file("a.vtf", b"x")
            .build();
        let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();
        assert_eq!(pak.entries()[0].hints, PackHints::new(0x101, 0x8));
    }

    #[test]
    fn test_bad_magic() {
        let temp = TempDir::new().unwrap();
        let err = PakArchive::open(write_pak(&temp, b"NOPE\x01\x00")).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m == "bad magic"));
    }

    #[test]
    fn test_truncated_index() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new().add_file("a.txt", b"hello").build();
        let err = PakArchive::open(write_pak(&temp, &bytes[..12])).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m.contains("truncated")));
    }

    #[test]
    fn test_unsafe_path_rejected() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new().add_file("../escape.txt", b"x").build();
        let err = PakArchive::open(write_pak(&temp, &bytes)).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(_)));
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new()
            .add_file("a.txt", b"1")
            .add_file("a.txt", b"2")
            .build();
        let err = PakArchive::open(write_pak(&temp, &bytes)).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn test_corrupt_chunk_fails_checksum() {
        let temp = TempDir::new().unwrap();
        let mut bytes = PakBuilder::new()
            .codec(CompressionCodec::Stored)
            .add_file("a.txt", b"hello world")
            .build();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();
        let err = pak.read_chunk(0, 0).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m.contains("checksum")));
    }

    #[test]
    fn test_implausible_chunk_size_rejected_at_open() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new()
            .codec(CompressionCodec::Deflate)
            .add_file("a.bin", &[1u8; 64])
            .declare_size(1 << 62)
            .build();
        let err = PakArchive::open(write_pak(&temp, &bytes)).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m.contains("exceeds")));
    }

    #[test]
    fn test_declared_size_larger_than_data() {
        let temp = TempDir::new().unwrap();
        for codec in [CompressionCodec::Deflate, CompressionCodec::Zstd] {
            let bytes = PakBuilder::new()
                .codec(codec)
                .add_file("a.bin", &[1u8; 64])
                .declare_size(MAX_CHUNK_SIZE)
                .build();
            let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();
            let err = pak.read_chunk(0, 0).unwrap_err();
            assert!(
                matches!(err, ExtractionError::InvalidArchive(ref m) if m.contains("decoded 64 bytes")),
                "{err}"
            );
        }
    }

    #[test]
    fn test_declared_size_smaller_than_data() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new()
            .codec(CompressionCodec::Zstd)
            .add_file("a.bin", &[1u8; 64])
            .declare_size(10)
            .build();
        let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();
        let err = pak.read_chunk(0, 0).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m.contains("expected 10")));
    }

    #[test]
    fn test_out_of_range_indices() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new().add_file("a.txt", b"x").build();
        let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();
        assert!(pak.read_chunk(1, 0).is_err());
        assert!(pak.read_chunk(0, 1).is_err());
    }

    #[test]
    fn test_empty_entry_has_no_chunks() {
        let temp = TempDir::new().unwrap();
        let bytes = PakBuilder::new().add_file("empty", b"").build();
        let pak = PakArchive::open(write_pak(&temp, &bytes)).unwrap();
        assert!(pak.entries()[0].chunks.is_empty());
    }
}
