//! Line-per-entry transcript implementing `ProgressCallback`.

use console::Term;
use unpak_core::ProgressCallback;
use unpak_core::Stage;
use unpak_core::units::format_size_si;

/// Prints preparation stages and one line per entry to stdout:
///
/// ```text
/// ... generating .pakflags
/// [   1/   3] scripts/main.nut (1.2 kB)
/// [   2/   3] secrets/key.pem (excluded)
/// ```
pub struct TranscriptProgress {
    term: Term,
}

impl Default for TranscriptProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptProgress {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    pub fn stage_line(stage: Stage) -> String {
        format!("... {stage}")
    }

    pub fn entry_line(path: &str, size: u64, current: usize, total: usize) -> String {
        format!("[{current:4}/{total:4}] {path} ({})", format_size_si(size))
    }

    pub fn excluded_line(path: &str, current: usize, total: usize) -> String {
        format!("[{current:4}/{total:4}] {path} (excluded)")
    }
}

impl ProgressCallback for TranscriptProgress {
    fn on_stage(&mut self, stage: Stage) {
        let _ = self.term.write_line(&Self::stage_line(stage));
        if stage == Stage::SavingIgnore {
            let _ = self.term.write_line("");
        }
    }

    fn on_entry_start(&mut self, path: &str, size: u64, current: usize, total: usize) {
        let _ = self
            .term
            .write_line(&Self::entry_line(path, size, current, total));
    }

    fn on_entry_excluded(&mut self, path: &str, current: usize, total: usize) {
        let _ = self
            .term
            .write_line(&Self::excluded_line(path, current, total));
    }

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &str) {}

    fn on_complete(&mut self) {}
}
