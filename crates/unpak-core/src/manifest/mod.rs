//! Sidecar manifests regenerated from an archive listing.
//!
//! - [`PackHintsManifest`] (`.pakflags`): per-directory packing hints
//! - [`IgnoreManifest`] (`.pakignore`): names to leave out when repacking

pub mod hints;
pub mod ignore;

pub use hints::PackHintsManifest;
pub use ignore::IgnoreManifest;

/// File name of the packing-hint manifest at the output root.
pub const HINTS_FILE_NAME: &str = ".pakflags";

/// File name of the ignore manifest at the output root.
pub const IGNORE_FILE_NAME: &str = ".pakignore";
