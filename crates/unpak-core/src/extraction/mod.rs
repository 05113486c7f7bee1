//! Extraction pipeline.
//!
//! - [`ExtractionEngine`]: filters entries and writes them one at a time
//! - [`ChunkReader`]: ordered decoding of one entry's chunks
//! - [`write_atomic`]: temp file plus no-clobber move

pub mod atomic;
pub mod engine;
pub mod stream;

pub use atomic::write_atomic;
pub use engine::ExtractionEngine;
pub use stream::ChunkReader;
pub use stream::DecodePool;
