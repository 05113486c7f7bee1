//! Error conversion utilities for CLI.
//!
//! Converts unpak-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use std::path::Path;

use anyhow::anyhow;
use unpak_core::ExtractionError;

/// Converts `ExtractionError` to a user-friendly anyhow error with context.
pub fn convert_unpack_error(
    err: ExtractionError,
    output_dir: &Path,
    source: Option<&Path>,
) -> anyhow::Error {
    let source_name = source.map_or_else(|| "(none)".to_string(), |s| s.display().to_string());
    match err {
        ExtractionError::InvalidPattern { pattern, reason } => {
            anyhow!(
                "Invalid filter pattern {pattern:?}: {reason}\n\
                 HINT: Patterns use glob syntax (*, ?, [abc]). A leading / anchors the pattern \
                 to the archive root."
            )
        }
        ExtractionError::DestinationNotEmpty { path, name } => {
            anyhow!(
                "Output directory '{}' must not exist or be empty (other than ignored files), \
                 found {name:?}\n\
                 HINT: Choose a new output directory, or remove {name:?} first.",
                path.display()
            )
        }
        ExtractionError::DestinationExists { path } => {
            anyhow!(
                "Refusing to overwrite '{}'\n\
                 HINT: Another process may be writing to '{}'. Unpack into a fresh directory.",
                path.display(),
                output_dir.display()
            )
        }
        ExtractionError::UnsupportedFormat => {
            anyhow!(
                "Source not supported: {source_name}\n\
                 HINT: Pass a pak file or a directory."
            )
        }
        ExtractionError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{source_name}': {reason}\n\
                 HINT: The archive may be corrupted or truncated. Files already extracted \
                 are complete; the failing file was not written."
            )
        }
        ExtractionError::ManifestMismatch { reason, manifest } => {
            anyhow!(
                "BUG: generated manifest failed validation: {reason}\n\
                 Please report this, including the manifest below.\n\n{manifest}"
            )
        }
        _ => anyhow::Error::from(err).context(format!(
            "Error unpacking '{source_name}' into '{}'",
            output_dir.display()
        )),
    }
}
