//! Chunk compression codecs.
//!
//! Each chunk of a pak entry is compressed independently, so chunks can be
//! decoded on any worker thread in any order.

use std::io;
use std::io::Read;

// Upper bound on the up-front allocation for one decoded chunk.
const INITIAL_CAPACITY_LIMIT: usize = 1024 * 1024;

/// Compression codec of a single chunk.
///
/// The discriminant is the on-disk codec byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionCodec {
    /// Chunk bytes are stored as-is.
    Stored = 0,
    /// Raw deflate stream.
    Deflate = 1,
    /// Zstandard frame.
    Zstd = 2,
}

impl CompressionCodec {
    /// Maps an on-disk codec byte to a codec.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Stored),
            1 => Some(Self::Deflate),
            2 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Returns the on-disk codec byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable name for this codec.
    ///
    /// # Examples
    ///
    /// ```
    /// use unpak_core::formats::compression::CompressionCodec;
    ///
    /// assert_eq!(CompressionCodec::Deflate.name(), "deflate");
    /// assert_eq!(CompressionCodec::Zstd.name(), "zstd");
    /// ```
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Deflate => "deflate",
            Self::Zstd => "zstd",
        }
    }

    /// Decodes one chunk, reading at most one byte more than `expected`.
    ///
    /// `expected` comes from an untrusted index, so it only bounds the
    /// output; the buffer grows with the data actually decoded. A result
    /// longer than `expected` means the stream is oversized.
    ///
    /// # Errors
    ///
    /// Returns an error if the compressed stream is malformed.
    pub fn decompress(self, data: &[u8], expected: usize) -> io::Result<Vec<u8>> {
        let limit = (expected as u64).saturating_add(1);
        let mut out = Vec::with_capacity(expected.min(INITIAL_CAPACITY_LIMIT));
        match self {
            Self::Stored => {
                Read::take(data, limit).read_to_end(&mut out)?;
            }
            Self::Deflate => {
                flate2::read::DeflateDecoder::new(data)
                    .take(limit)
                    .read_to_end(&mut out)?;
            }
            Self::Zstd => {
                zstd::stream::read::Decoder::with_buffer(data)?
                    .take(limit)
                    .read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }

    /// Encodes one chunk. Only used to build fixtures.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        use std::io::Write;

        match self {
            Self::Stored => Ok(data.to_vec()),
            Self::Deflate => {
                let mut encoder =
                    flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Zstd => zstd::bulk::compress(data, 3),
        }
    }
}

/// CRC-32 (IEEE) of `data`, as stored in the pak index.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_bytes() {
        for codec in [
            CompressionCodec::Stored,
            CompressionCodec::Deflate,
            CompressionCodec::Zstd,
        ] {
            assert_eq!(CompressionCodec::from_byte(codec.as_byte()), Some(codec));
        }
        assert_eq!(CompressionCodec::from_byte(3), None);
    }

    #[test]
    fn test_codec_decodes_what_it_encodes() {
        let data = b"chunk chunk chunk chunk chunk chunk".repeat(20);
        for codec in [CompressionCodec::Deflate, CompressionCodec::Zstd] {
            let packed = codec.compress(&data).unwrap();
            assert!(packed.len() < data.len(), "{}", codec.name());
            assert_eq!(codec.decompress(&packed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_deflate_oversized_output_is_noticed() {
        let data = vec![7u8; 4096];
        let packed = CompressionCodec::Deflate.compress(&data).unwrap();
        let out = CompressionCodec::Deflate.decompress(&packed, 100).unwrap();
        assert_eq!(out.len(), 101);
    }

    #[test]
    fn test_zstd_oversized_output_is_noticed() {
        let data = vec![7u8; 4096];
        let packed = CompressionCodec::Zstd.compress(&data).unwrap();
        let out = CompressionCodec::Zstd.decompress(&packed, 100).unwrap();
        assert_eq!(out.len(), 101);
    }

    #[test]
    fn test_huge_declared_size_does_not_preallocate() {
        let data = b"small payload".repeat(10);
        for codec in [
            CompressionCodec::Stored,
            CompressionCodec::Deflate,
            CompressionCodec::Zstd,
        ] {
            let packed = codec.compress(&data).unwrap();
            let out = codec.decompress(&packed, usize::MAX / 4).unwrap();
            assert_eq!(out, data, "{}", codec.name());
        }
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(CompressionCodec::Zstd.decompress(b"not zstd", 10).is_err());
    }

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }
}
