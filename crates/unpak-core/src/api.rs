//! High-level public API.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::ExtractionError;
use crate::ExtractionReport;
use crate::ProgressCallback;
use crate::Result;
use crate::UnpackConfig;
use crate::config::available_parallelism;
use crate::extraction::ExtractionEngine;
use crate::extraction::engine::MAX_DECODE_THREADS;
use crate::filter::FilterSet;
use crate::formats::ArchiveSource;
use crate::formats::entry::validate_entry_path;
use crate::formats::open_source;
use crate::manifest::HINTS_FILE_NAME;
use crate::manifest::IGNORE_FILE_NAME;
use crate::manifest::IgnoreManifest;
use crate::manifest::PackHintsManifest;
use crate::report::Stage;

/// Unpacks `source` into `output_dir`, or initializes an empty project there
/// when `source` is `None`.
///
/// The steps are:
/// 1. compile the exclude/include filters
/// 2. open the source (a pak file or a directory)
/// 3. generate `.pakflags` and check that it reproduces every entry's hints
/// 4. generate `.pakignore`
/// 5. create `output_dir` if needed and check that everything already in it
///    is ignored by `.pakignore`
/// 6. write both sidecars
/// 7. extract the entries the filters keep
///
/// # Errors
///
/// Returns an error if:
/// - a filter pattern is malformed (before anything is opened or written)
/// - the source cannot be opened or is corrupt
/// - `output_dir` holds something `.pakignore` does not cover
/// - a filesystem operation fails
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use unpak_core::{NoopProgress, UnpackConfig, unpack};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = UnpackConfig::default().with_exclude(["*.bak"]);
/// let report = unpack("out", Some(Path::new("game.pak")), &config, &mut NoopProgress)?;
/// println!("extracted {} files", report.entries_extracted);
/// # Ok(())
/// # }
/// ```
pub fn unpack<P: AsRef<Path>>(
    output_dir: P,
    source: Option<&Path>,
    config: &UnpackConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let filters = FilterSet::new(&config.exclude, &config.include)?;
    let source = source.map(open_source).transpose()?;
    run(output_dir.as_ref(), filters, source, config, progress)
}

/// Like [`unpack`], for an already opened source.
///
/// # Errors
///
/// See [`unpack`].
pub fn unpack_source<P: AsRef<Path>>(
    output_dir: P,
    source: Option<Arc<dyn ArchiveSource>>,
    config: &UnpackConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let filters = FilterSet::new(&config.exclude, &config.include)?;
    run(output_dir.as_ref(), filters, source, config, progress)
}

fn run(
    output_dir: &Path,
    filters: FilterSet,
    source: Option<Arc<dyn ArchiveSource>>,
    config: &UnpackConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let entries = source.as_deref().map_or(&[][..], |s| s.entries());
    for entry in entries {
        validate_entry_path(&entry.path)?;
    }

    let explicit = config.explicit_hints && source.is_some();
    progress.on_stage(Stage::GeneratingHints { explicit });
    let hints = if explicit {
        PackHintsManifest::generate_explicit(entries)
    } else {
        PackHintsManifest::generate(entries)
    };
    hints.validate(entries)?;

    progress.on_stage(Stage::GeneratingIgnore {
        defaults: config.default_ignores,
    });
    let mut ignore = IgnoreManifest::default();
    if config.default_ignores {
        ignore.add_defaults()?;
    }
    let kept = ignore.add_auto_exclusions(entries)?;
    if kept > 0 {
        debug!(count = kept, "added ignore exceptions for archive entries");
    }

    progress.on_stage(Stage::CreatingOutputDir);
    check_destination(output_dir, &ignore)?;

    progress.on_stage(Stage::SavingHints);
    write_sidecar(output_dir, HINTS_FILE_NAME, &hints.to_string())?;
    progress.on_stage(Stage::SavingIgnore);
    write_sidecar(output_dir, IGNORE_FILE_NAME, &ignore.to_string())?;

    let Some(source) = source else {
        info!(output = %output_dir.display(), "initialized empty project");
        progress.on_complete();
        return Ok(ExtractionReport::new());
    };

    info!(
        format = source.format_name(),
        entries = source.entries().len(),
        threads = config.threads,
        "extracting"
    );
    let engine = if raise_global_threads(config) {
        ExtractionEngine::on_global_pool(filters, config.threads)
    } else {
        ExtractionEngine::new(filters, config.threads)?
    };
    engine.run(&source, output_dir, progress)
}

/// Creates `output_dir` if missing and checks that every name directly
/// inside it is matched by `ignore`.
///
/// Names are checked in sorted order so the reported offender is stable.
///
/// # Errors
///
/// Returns [`ExtractionError::DestinationNotEmpty`] naming the first
/// offending entry, or a filesystem error.
pub fn check_destination(output_dir: &Path, ignore: &IgnoreManifest) -> Result<()> {
    fs::create_dir_all(output_dir)
        .map_err(|e| ExtractionError::fs("create output directory", output_dir, e))?;
    let mut names = fs::read_dir(output_dir)
        .map_err(|e| ExtractionError::fs("list output directory", output_dir, e))?
        .map(|item| {
            item.map(|e| e.file_name().to_string_lossy().into_owned())
                .map_err(|e| ExtractionError::fs("list output directory", output_dir, e))
        })
        .collect::<Result<Vec<_>>>()?;
    names.sort();
    if let Some(name) = names.into_iter().find(|name| !ignore.matches(name)) {
        return Err(ExtractionError::DestinationNotEmpty {
            path: output_dir.to_path_buf(),
            name,
        });
    }
    Ok(())
}

fn write_sidecar(output_dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = output_dir.join(name);
    fs::write(&path, contents).map_err(|e| ExtractionError::fs("write", path, e))
}

/// Set once this crate has sized rayon's global pool.
static GLOBAL_POOL_SIZED: AtomicBool = AtomicBool::new(false);

/// Sizes rayon's global pool to the thread budget when asked to and the
/// budget exceeds the available parallelism. Returns `true` if extraction
/// should decode on the global pool.
///
/// The global pool can only be built once per process; later runs that ask
/// for it reuse the pool an earlier run sized.
fn raise_global_threads(config: &UnpackConfig) -> bool {
    if !config.raise_global_threads || config.threads <= available_parallelism() {
        return false;
    }
    if GLOBAL_POOL_SIZED.load(Ordering::Acquire) {
        return true;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.min(MAX_DECODE_THREADS))
        .thread_name(|i| format!("unpak-global-{i}"))
        .build_global()
    {
        Ok(()) => {
            GLOBAL_POOL_SIZED.store(true, Ordering::Release);
            debug!(threads = config.threads, "sized global thread pool");
            true
        }
        Err(e) => {
            warn!(error = %e, "global thread pool already configured, using a dedicated pool");
            false
        }
    }
}
