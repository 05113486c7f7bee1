//! Output formatter trait for CLI results.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use unpak_core::ExtractionReport;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Announce what is about to happen
    fn format_start(&self, output_dir: &Path, source: Option<&Path>);

    /// Format the result of a successful run
    fn format_unpack_result(&self, report: &ExtractionReport) -> Result<()>;

    /// Whether the per-entry transcript should be printed
    fn wants_transcript(&self) -> bool;
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
        }
    }
}
