//! Unpack configuration.

use std::num::NonZeroUsize;

/// Options for a single [`crate::unpack`] run.
///
/// # Examples
///
/// ```
/// use unpak_core::UnpackConfig;
///
/// let config = UnpackConfig::default()
///     .with_threads(UnpackConfig::clamp_threads(-3))
///     .with_exclude(["/secrets"])
///     .with_include(["/secrets/public.txt"]);
/// assert_eq!(config.threads, 0);
/// assert!(config.default_ignores);
/// ```
#[derive(Debug, Clone)]
pub struct UnpackConfig {
    /// Chunks decoded ahead of the writer, per file. `0` decodes lazily on
    /// the calling thread as the file is written.
    pub threads: usize,

    /// Exclude patterns, in command-line order.
    pub exclude: Vec<String>,

    /// Include patterns that rescue excluded entries.
    pub include: Vec<String>,

    /// Write one `.pakflags` line per entry instead of relying on directory
    /// inheritance.
    pub explicit_hints: bool,

    /// Seed `.pakignore` with the built-in ignore list.
    pub default_ignores: bool,

    /// When `threads` exceeds the available parallelism, also size rayon's
    /// global pool to `threads`.
    pub raise_global_threads: bool,
}

impl Default for UnpackConfig {
    /// Creates a configuration with:
    /// - `threads`: available parallelism (1 if unknown)
    /// - no filters
    /// - inherited hints and default ignores
    fn default() -> Self {
        Self {
            threads: available_parallelism(),
            exclude: Vec::new(),
            include: Vec::new(),
            explicit_hints: false,
            default_ignores: true,
            raise_global_threads: false,
        }
    }
}

impl UnpackConfig {
    /// Converts a possibly negative thread count from the command line.
    #[must_use]
    pub fn clamp_threads(requested: i64) -> usize {
        usize::try_from(requested.max(0)).unwrap_or(usize::MAX)
    }

    /// Sets the decompression thread budget.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the exclude patterns.
    #[must_use]
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the include patterns.
    #[must_use]
    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Enables one-line-per-entry packing hints.
    #[must_use]
    pub fn with_explicit_hints(mut self, explicit: bool) -> Self {
        self.explicit_hints = explicit;
        self
    }

    /// Enables or disables the built-in ignore list.
    #[must_use]
    pub fn with_default_ignores(mut self, enabled: bool) -> Self {
        self.default_ignores = enabled;
        self
    }

    /// Enables sizing rayon's global pool from `threads`.
    #[must_use]
    pub fn with_raise_global_threads(mut self, enabled: bool) -> Self {
        self.raise_global_threads = enabled;
        self
    }
}

/// Logical CPUs reported by the OS, or 1.
#[must_use]
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
