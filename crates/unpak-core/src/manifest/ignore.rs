//! Ignore manifest (`.pakignore`).
//!
//! One pattern per line, matched with [`FilterPattern`]. A leading `!`
//! negates the line, `#` starts a comment, and the last matching line
//! decides.

use std::fmt;

use crate::Result;
use crate::filter::FilterPattern;
use crate::formats::ArchiveEntry;
use crate::manifest::HINTS_FILE_NAME;
use crate::manifest::IGNORE_FILE_NAME;

/// Patterns added by [`IgnoreManifest::add_defaults`], after the two sidecar
/// names.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "*.orig",
    "*.rej",
    "*~",
];

#[derive(Debug, Clone)]
struct Rule {
    pattern: FilterPattern,
    negate: bool,
}

/// Ordered ignore rules.
///
/// # Examples
///
/// ```
/// use unpak_core::manifest::IgnoreManifest;
///
/// let mut ignore = IgnoreManifest::default();
/// ignore.add_defaults()?;
/// assert!(ignore.matches(".git"));
/// assert!(ignore.matches("notes.txt~"));
/// assert!(!ignore.matches("scripts"));
/// # Ok::<(), unpak_core::ExtractionError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct IgnoreManifest {
    rules: Vec<Rule>,
}

impl IgnoreManifest {
    /// Parses manifest text, one rule per line.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExtractionError::InvalidPattern`] for the first line
    /// that is not a valid glob.
    pub fn parse(text: &str) -> Result<Self> {
        let mut manifest = Self::default();
        for line in text.lines() {
            manifest.add(line)?;
        }
        Ok(manifest)
    }

    /// Appends one line. Blank lines and comments are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExtractionError::InvalidPattern`] if the pattern is
    /// not a valid glob.
    pub fn add(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let (body, negate) = match line.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        self.rules.push(Rule {
            pattern: FilterPattern::parse(body)?,
            negate,
        });
        Ok(())
    }

    /// Adds the sidecar manifests and common editor/VCS/OS clutter.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in list; the `Result` comes from [`add`].
    ///
    /// [`add`]: Self::add
    pub fn add_defaults(&mut self) -> Result<()> {
        self.add(HINTS_FILE_NAME)?;
        self.add(IGNORE_FILE_NAME)?;
        for pattern in DEFAULT_IGNORES {
            self.add(pattern)?;
        }
        Ok(())
    }

    /// Adds an anchored negation for every entry the current rules would
    /// ignore, so that repacking the output keeps it.
    ///
    /// Returns the number of lines added.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExtractionError::InvalidPattern`] if an escaped path
    /// fails to compile.
    pub fn add_auto_exclusions(&mut self, entries: &[ArchiveEntry]) -> Result<usize> {
        let mut added = 0;
        for entry in entries {
            if self.matches(&entry.path) {
                self.add(&format!("!/{}", escape_path(&entry.path)))?;
                added += 1;
            }
        }
        Ok(added)
    }

    /// Returns `true` if the last rule matching `path` is not negated.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.pattern.matches(path))
            .is_some_and(|rule| !rule.negate)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for IgnoreManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            if rule.negate {
                f.write_str("!")?;
            }
            writeln!(f, "{}", rule.pattern)?;
        }
        Ok(())
    }
}

/// Escapes `path` as a literal glob that survives the line trimming in
/// [`IgnoreManifest::add`].
fn escape_path(path: &str) -> String {
    let escaped = glob::Pattern::escape(path);
    match escaped.strip_suffix(' ') {
        Some(head) => format!("{head}[ ]"),
        None => escaped,
    }
}
