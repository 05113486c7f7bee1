//! Human-readable output formatter.

use std::path::Path;

use anyhow::Result;
use console::Term;
use console::style;
use unpak_core::ExtractionReport;
use unpak_core::units::format_size_si;

use super::formatter::OutputFormatter;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn summary_line(report: &ExtractionReport) -> String {
        if report.has_exclusions() {
            format!(
                "success ({} files excluded by command-line filter)",
                report.entries_excluded
            )
        } else {
            "success".to_string()
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_start(&self, output_dir: &Path, source: Option<&Path>) {
        if self.quiet {
            return;
        }
        let line = match source {
            Some(source) => format!(
                "unpacking {:?} to {:?}",
                source.display().to_string(),
                output_dir.display().to_string()
            ),
            None => format!(
                "initializing new project in {:?}",
                output_dir.display().to_string()
            ),
        };
        let _ = self.term.write_line(&line);
    }

    fn format_unpack_result(&self, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let line = Self::summary_line(report);
        if self.use_colors {
            self.term.write_line(&style(line).green().to_string())?;
        } else {
            self.term.write_line(&line)?;
        }

        if self.verbose {
            self.term.write_line(&format!(
                "  {} of {} files extracted, {} written in {:.2?}",
                report.entries_extracted,
                report.entries_total,
                format_size_si(report.bytes_written),
                report.duration
            ))?;
        }

        Ok(())
    }

    fn wants_transcript(&self) -> bool {
        !self.quiet
    }
}
