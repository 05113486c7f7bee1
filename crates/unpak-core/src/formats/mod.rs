//! Archive sources.
//!
//! The extraction pipeline only sees [`ArchiveSource`]: an entry listing plus
//! random access to decoded chunks.

pub mod compression;
pub mod detect;
pub mod dir;
pub mod entry;
pub mod pak;
pub mod traits;

// Re-export main types for convenience
pub use compression::CompressionCodec;
pub use detect::SourceKind;
pub use detect::open_source;
pub use dir::DirectorySource;
pub use entry::ArchiveEntry;
pub use entry::Chunk;
pub use entry::PackHints;
pub use pak::PakArchive;
pub use traits::ArchiveSource;
