//! JSON output formatter for machine-readable results.

use std::io;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use unpak_core::ExtractionReport;

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;

pub struct JsonFormatter;

#[derive(Serialize)]
struct UnpackOutput {
    entries_total: usize,
    entries_extracted: usize,
    entries_excluded: usize,
    bytes_written: u64,
    duration_ms: u128,
}

impl From<&ExtractionReport> for UnpackOutput {
    fn from(report: &ExtractionReport) -> Self {
        Self {
            entries_total: report.entries_total,
            entries_extracted: report.entries_extracted,
            entries_excluded: report.entries_excluded,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_start(&self, _output_dir: &Path, _source: Option<&Path>) {}

    fn format_unpack_result(&self, report: &ExtractionReport) -> Result<()> {
        Self::output(&JsonOutput::success("unpack", UnpackOutput::from(report)))
    }

    fn wants_transcript(&self) -> bool {
        false
    }
}
