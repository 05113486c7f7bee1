//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::Parser;
use unpak_core::UnpackConfig;

#[derive(Parser)]
#[command(name = "unpak")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output directory (must not exist or be empty other than ignored files)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Pak file or directory to unpack (omit to initialize an empty project)
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// Exclude files or directories matching a glob (anchor to the start with /)
    ///
    /// Globs support `*`, `?`, `[a-z]` and `[!a-z]`; `**` must be a whole
    /// path component.
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "PATTERN",
        value_delimiter = ','
    )]
    pub exclude: Vec<String>,

    /// Negate --exclude for files or directories matching a glob
    #[arg(
        short = 'i',
        long = "include",
        value_name = "PATTERN",
        value_delimiter = ','
    )]
    pub include: Vec<String>,

    /// Decompression threads per file; 0 decodes chunks as they are read
    /// [default: number of cores]
    #[arg(short = 'j', long, value_name = "N", allow_negative_numbers = true)]
    pub threads: Option<i64>,

    /// Write one .pakflags line per file instead of relying on inheritance
    #[arg(long)]
    pub hints_explicit: bool,

    /// Do not add the default .pakignore entries
    #[arg(long)]
    pub ignore_no_default: bool,

    /// Also size the process-wide thread pool when --threads exceeds the
    /// number of cores
    #[arg(long)]
    pub raise_global_threads: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,
}

impl Cli {
    /// Builds the library configuration from the parsed flags.
    pub fn config(&self) -> UnpackConfig {
        let mut config = UnpackConfig::default()
            .with_exclude(self.exclude.iter().cloned())
            .with_include(self.include.iter().cloned())
            .with_explicit_hints(self.hints_explicit)
            .with_default_ignores(!self.ignore_no_default)
            .with_raise_global_threads(self.raise_global_threads);
        if let Some(threads) = self.threads {
            config.threads = UnpackConfig::clamp_threads(threads);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("unpak").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_arguments() {
        let cli = parse(&["out"]);
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert!(cli.source.is_none());

        let cli = parse(&["out", "game.pak"]);
        assert_eq!(cli.source, Some(PathBuf::from("game.pak")));
    }

    #[test]
    fn test_patterns_repeat_and_split_on_commas() {
        let cli = parse(&["-x", "/a,*.tmp", "--exclude", "/b", "-i", "/a/keep", "out"]);
        assert_eq!(cli.exclude, ["/a", "*.tmp", "/b"]);
        assert_eq!(cli.include, ["/a/keep"]);
    }

    #[test]
    fn test_negative_threads_are_clamped() {
        let cli = parse(&["-j", "-4", "out"]);
        assert_eq!(cli.threads, Some(-4));
        assert_eq!(cli.config().threads, 0);
    }

    #[test]
    fn test_config_defaults() {
        let config = parse(&["out"]).config();
        let defaults = UnpackConfig::default();
        assert_eq!(config.threads, defaults.threads);
        assert!(config.default_ignores);
        assert!(!config.explicit_hints);
        assert!(!config.raise_global_threads);
    }

    #[test]
    fn test_config_flags() {
        let config = parse(&[
            "--hints-explicit",
            "--ignore-no-default",
            "--raise-global-threads",
            "-j",
            "3",
            "out",
        ])
        .config();
        assert!(config.explicit_hints);
        assert!(!config.default_ignores);
        assert!(config.raise_global_threads);
        assert_eq!(config.threads, 3);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["unpak", "-q", "-v", "out"]).is_err());
    }
}
