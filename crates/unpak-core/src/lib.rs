//! Filtered, atomic extraction of chunked archives.
//!
//! `unpak-core` unpacks a pak archive (or mirrors a plain directory) into an
//! output tree. Entries can be dropped with parent-aware glob filters, each
//! file is written through a temp file and moved into place without
//! replacing anything, and an entry's chunks can be decoded in parallel
//! while still being written in order. Two sidecar manifests describing the
//! archive, `.pakflags` and `.pakignore`, are regenerated at the output root.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use unpak_core::{NoopProgress, UnpackConfig, unpack};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UnpackConfig::default()
//!     .with_exclude(["/secrets"])
//!     .with_include(["/secrets/public.txt"]);
//! let report = unpack("out", Some(Path::new("game.pak")), &config, &mut NoopProgress)?;
//! println!(
//!     "extracted {} files, {} excluded",
//!     report.entries_extracted, report.entries_excluded
//! );
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod filter;
pub mod formats;
pub mod io;
pub mod manifest;
pub mod report;
pub mod units;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main API types
pub use api::unpack;
pub use api::unpack_source;
pub use config::UnpackConfig;
pub use error::ExtractionError;
pub use error::Result;
pub use filter::FilterSet;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;
pub use report::Stage;
pub use units::format_bytes_si;
