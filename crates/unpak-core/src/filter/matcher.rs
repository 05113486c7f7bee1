//! Parent-aware glob matching.
//!
//! A [`FilterPattern`] is tested against a slash-separated relative path and
//! every one of its ancestor directories, so a pattern naming a directory
//! selects everything beneath it. Unanchored patterns are also tested against
//! the bare name of the path and of each ancestor; a leading `/` anchors the
//! pattern so it only ever sees root-relative prefixes.

use std::fmt;
use std::str::FromStr;

use glob::MatchOptions;
use glob::Pattern;

use crate::ExtractionError;
use crate::Result;

// `*` and `?` never cross a `/`, and dotfiles are not special.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled glob plus its anchoring flag.
///
/// # Examples
///
/// ```
/// use unpak_core::filter::FilterPattern;
///
/// let tmp = FilterPattern::parse("*.tmp")?;
/// assert!(tmp.matches("cache/deep/file.tmp"));
///
/// let root_only = FilterPattern::parse("/cache")?;
/// assert!(root_only.matches("cache/deep/file.tmp"));
/// assert!(!root_only.matches("other/cache/file.tmp"));
/// # Ok::<(), unpak_core::ExtractionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FilterPattern {
    raw: String,
    pattern: Pattern,
    anchored: bool,
}

impl FilterPattern {
    /// Compiles a pattern as written on the command line.
    ///
    /// A single leading `/` marks the pattern as anchored and is stripped
    /// before compiling the glob.
    ///
    /// The rest uses [`glob::Pattern`] syntax: `*` and `?` stay within one
    /// path component, `[abc]` and `[a-z]` match one character, and the
    /// negated class is written `[!abc]` (`[^abc]` is a class containing
    /// `^`). `**` must be a whole component, as in `a/**/b`; `a**b` is
    /// rejected. Escape a metacharacter by wrapping it in brackets, e.g.
    /// `[*]`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidPattern`] if the glob syntax is
    /// invalid (for example an unclosed `[`).
    pub fn parse(raw: &str) -> Result<Self> {
        let (body, anchored) = match raw.strip_prefix('/') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        let pattern = Pattern::new(body).map_err(|e| ExtractionError::InvalidPattern {
            pattern: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            pattern,
            anchored,
        })
    }

    /// Returns the pattern exactly as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the pattern was written with a leading `/`.
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Tests `path` and each of its ancestors against the pattern.
    ///
    /// For every prefix `name` of `path` ending at a directory boundary,
    /// longest first, the full `name` is tested; if the pattern is not
    /// anchored, the last component of `name` is tested too.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let mut name = path;
        while !name.is_empty() {
            if self.pattern.matches_with(name, MATCH_OPTIONS) {
                return true;
            }
            let (parent, base) = split(name);
            if !self.anchored && self.pattern.matches_with(base, MATCH_OPTIONS) {
                return true;
            }
            name = parent.trim_end_matches('/');
        }
        false
    }
}

impl FromStr for FilterPattern {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compiles `pattern` and matches it against `path` in one step.
///
/// Prefer [`FilterPattern::parse`] when the same pattern is tested against
/// many paths.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidPattern`] for malformed globs.
pub fn match_glob_parents(pattern: &str, path: &str) -> Result<bool> {
    Ok(FilterPattern::parse(pattern)?.matches(path))
}

/// Splits after the final `/`, keeping the separator on the parent side.
fn split(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(i) => (&name[..=i], &name[i + 1..]),
        None => ("", name),
    }
}
