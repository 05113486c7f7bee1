//! Unpack reporting.

use std::fmt;
use std::time::Duration;

/// Report of an unpack run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Number of entries listed by the source.
    pub entries_total: usize,

    /// Number of entries written to the output directory.
    pub entries_extracted: usize,

    /// Number of entries skipped by the exclude/include filters.
    pub entries_excluded: usize,

    /// Total bytes written to extracted files.
    pub bytes_written: u64,

    /// Wall time of the extraction pass.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the filters dropped anything.
    #[must_use]
    pub fn has_exclusions(&self) -> bool {
        self.entries_excluded > 0
    }
}

/// Preparation steps announced before extraction starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building `.pakflags`.
    GeneratingHints {
        /// One line per entry, no inheritance.
        explicit: bool,
    },
    /// Building `.pakignore`.
    GeneratingIgnore {
        /// Built-in ignore list included.
        defaults: bool,
    },
    /// Creating and checking the output directory.
    CreatingOutputDir,
    /// Writing `.pakflags`.
    SavingHints,
    /// Writing `.pakignore`.
    SavingIgnore,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneratingHints { explicit: false } => f.write_str("generating .pakflags"),
            Self::GeneratingHints { explicit: true } => {
                f.write_str("generating .pakflags (without inheritance)")
            }
            Self::GeneratingIgnore { defaults: true } => f.write_str("generating .pakignore"),
            Self::GeneratingIgnore { defaults: false } => {
                f.write_str("generating .pakignore (without default entries)")
            }
            Self::CreatingOutputDir => f.write_str("creating output directory"),
            Self::SavingHints => f.write_str("saving .pakflags"),
            Self::SavingIgnore => f.write_str("saving .pakignore"),
        }
    }
}

/// Callback trait for progress reporting during an unpack.
///
/// Entry callbacks arrive strictly in listing order. `current` is 1-based.
///
/// # Examples
///
/// ```
/// use unpak_core::ProgressCallback;
///
/// struct SimpleProgress;
///
/// impl ProgressCallback for SimpleProgress {
///     fn on_entry_start(&mut self, path: &str, size: u64, current: usize, total: usize) {
///         println!("[{current}/{total}] {path} ({size} bytes)");
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _path: &str) {}
///
///     fn on_complete(&mut self) {
///         println!("done");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called when a preparation step begins.
    fn on_stage(&mut self, _stage: Stage) {}

    /// Called before an entry is extracted.
    ///
    /// # Arguments
    ///
    /// * `path` - Archive path of the entry
    /// * `size` - Uncompressed size
    /// * `current` - Position in the listing (1-indexed)
    /// * `total` - Number of entries in the listing
    fn on_entry_start(&mut self, path: &str, size: u64, current: usize, total: usize);

    /// Called instead of [`on_entry_start`](Self::on_entry_start) for an
    /// entry the filters dropped.
    fn on_entry_excluded(&mut self, _path: &str, _current: usize, _total: usize) {}

    /// Called as decoded bytes reach the output file.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called once an entry is in place at its final path.
    fn on_entry_complete(&mut self, path: &str);

    /// Called when every entry has been handled.
    fn on_complete(&mut self);
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &str, _size: u64, _current: usize, _total: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &str) {}

    fn on_complete(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report() {
        let report = ExtractionReport::new();
        assert_eq!(report.entries_total, 0);
        assert_eq!(report.bytes_written, 0);
        assert!(!report.has_exclusions());
    }

    #[test]
    fn test_has_exclusions() {
        let report = ExtractionReport {
            entries_total: 3,
            entries_extracted: 2,
            entries_excluded: 1,
            ..ExtractionReport::default()
        };
        assert!(report.has_exclusions());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            Stage::GeneratingHints { explicit: true }.to_string(),
            "generating .pakflags (without inheritance)"
        );
        assert_eq!(
            Stage::GeneratingIgnore { defaults: false }.to_string(),
            "generating .pakignore (without default entries)"
        );
        assert_eq!(Stage::SavingIgnore.to_string(), "saving .pakignore");
    }
}
