//! I/O wrappers used by the extraction pipeline.

pub mod counting;

pub use counting::CountingWriter;
