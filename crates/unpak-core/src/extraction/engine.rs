//! Core extraction engine.

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use tracing::debug;
use tracing::info;

use crate::ExtractionError;
use crate::ExtractionReport;
use crate::ProgressCallback;
use crate::Result;
use crate::extraction::atomic::write_atomic;
use crate::extraction::stream::ChunkReader;
use crate::extraction::stream::DecodePool;
use crate::filter::FilterSet;
use crate::formats::ArchiveSource;
use crate::formats::entry::validate_entry_path;
use crate::io::CountingWriter;

/// Most worker threads a dedicated decode pool is started with. Larger
/// budgets still decode that many chunks ahead, sharing these workers.
pub const MAX_DECODE_THREADS: usize = 256;

/// Writes a source's entries into an output root, one at a time.
///
/// Entries are handled strictly in listing order and the next entry is not
/// started until the previous one has been moved into place or discarded.
/// Only the chunks of the entry being written are decoded concurrently.
/// The first failure stops the run.
pub struct ExtractionEngine {
    filters: FilterSet,
    threads: usize,
    pool: DecodePool,
}

impl ExtractionEngine {
    /// Creates an engine with its own decoding pool of `threads` workers,
    /// capped at [`MAX_DECODE_THREADS`]. `threads == 0` decodes on the
    /// calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn new(filters: FilterSet, threads: usize) -> Result<Self> {
        let pool = if threads == 0 {
            DecodePool::Inline
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads.min(MAX_DECODE_THREADS))
                .thread_name(|i| format!("unpak-decode-{i}"))
                .build()
                .map_err(|e| ExtractionError::Io(io::Error::other(e)))?;
            DecodePool::Dedicated(Arc::new(pool))
        };
        Ok(Self {
            filters,
            threads,
            pool,
        })
    }

    /// Creates an engine that decodes on rayon's global pool, keeping up to
    /// `threads` chunks in flight per entry.
    #[must_use]
    pub fn on_global_pool(filters: FilterSet, threads: usize) -> Self {
        let pool = if threads == 0 {
            DecodePool::Inline
        } else {
            DecodePool::Global
        };
        Self {
            filters,
            threads,
            pool,
        }
    }

    /// Where this engine decodes chunks.
    #[must_use]
    pub fn decode_pool(&self) -> &DecodePool {
        &self.pool
    }

    /// The filters this engine applies.
    #[must_use]
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Extracts every entry of `source` that the filters keep into `dest`.
    ///
    /// `dest` must exist. Parent directories of each entry are created as
    /// needed; existing files are never replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidArchive`] before writing anything
    /// if the source lists a path that is not a safe relative path.
    /// Otherwise returns the first archive, filesystem or destination error.
    /// Entries completed before the failure stay on disk; the failing entry
    /// leaves neither its final file nor a temp file behind.
    pub fn run(
        &self,
        source: &Arc<dyn ArchiveSource>,
        dest: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExtractionReport> {
        let start = Instant::now();
        for entry in source.entries() {
            validate_entry_path(&entry.path)?;
        }
        let total = source.entries().len();
        let mut report = ExtractionReport {
            entries_total: total,
            ..ExtractionReport::default()
        };

        for (index, entry) in source.entries().iter().enumerate() {
            let current = index + 1;
            if self.filters.is_excluded(&entry.path) {
                debug!(path = %entry.path, "excluded by filter");
                report.entries_excluded += 1;
                progress.on_entry_excluded(&entry.path, current, total);
                continue;
            }

            let size = entry.uncompressed_size();
            progress.on_entry_start(&entry.path, size, current, total);

            let target = dest.join(entry.relative_path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| ExtractionError::fs("create directory", parent, e))?;
            }

            let mut reader =
                ChunkReader::open(Arc::clone(source), index, self.threads, self.pool.clone())?;
            let written = write_atomic(dest, &target, |out| {
                let mut out = CountingWriter::new(out, &mut *progress);
                while let Some(chunk) = reader.next_chunk()? {
                    out.write_all(&chunk)
                        .map_err(|e| ExtractionError::fs("write", &target, e))?;
                }
                Ok(out.total_bytes())
            })?;

            debug!(path = %entry.path, bytes = written, "extracted entry");
            report.entries_extracted += 1;
            report.bytes_written += written;
            progress.on_entry_complete(&entry.path);
        }

        report.duration = start.elapsed();
        info!(
            extracted = report.entries_extracted,
            excluded = report.entries_excluded,
            bytes = report.bytes_written,
            "extraction finished"
        );
        progress.on_complete();
        Ok(report)
    }
}
