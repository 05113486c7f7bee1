//! Unpack command implementation.

use anyhow::Result;
use tracing::debug;
use unpak_core::NoopProgress;
use unpak_core::unpack;

use crate::cli::Cli;
use crate::error::convert_unpack_error;
use crate::output::OutputFormatter;
use crate::progress::TranscriptProgress;

pub fn execute(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = cli.config();
    debug!(
        threads = config.threads,
        exclude = ?config.exclude,
        include = ?config.include,
        "parsed configuration"
    );

    let source = cli.source.as_deref();
    formatter.format_start(&cli.output_dir, source);

    let result = if formatter.wants_transcript() {
        unpack(&cli.output_dir, source, &config, &mut TranscriptProgress::new())
    } else {
        unpack(&cli.output_dir, source, &config, &mut NoopProgress)
    };
    let report = result.map_err(|e| convert_unpack_error(e, &cli.output_dir, source))?;

    formatter.format_unpack_result(&report)
}
