//! Exclude/include filter chain.

use crate::Result;
use crate::filter::FilterPattern;

/// Ordered exclude and include pattern lists, compiled once per run.
///
/// An entry is excluded when it matches at least one exclude pattern and no
/// include pattern. Include patterns only rescue entries that an exclude
/// pattern selected; they never exclude anything themselves. Neither list is
/// short-circuited against the other, so the order of patterns within and
/// across the lists does not affect the decision.
///
/// # Examples
///
/// ```
/// use unpak_core::filter::FilterSet;
///
/// let filters = FilterSet::new(["/secrets"], ["/secrets/public.txt"])?;
/// assert!(filters.is_excluded("secrets/private.key"));
/// assert!(!filters.is_excluded("secrets/public.txt"));
/// assert!(!filters.is_excluded("readme.txt"));
/// # Ok::<(), unpak_core::ExtractionError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    exclude: Vec<FilterPattern>,
    include: Vec<FilterPattern>,
}

impl FilterSet {
    /// Compiles every pattern up front.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExtractionError::InvalidPattern`] for the first
    /// malformed pattern, excludes before includes.
    pub fn new<E, I>(exclude: E, include: I) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Ok(Self {
            exclude: compile(exclude)?,
            include: compile(include)?,
        })
    }

    /// Returns `true` if neither list has any pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.include.is_empty()
    }

    /// Exclude patterns in command-line order.
    #[must_use]
    pub fn exclude_patterns(&self) -> &[FilterPattern] {
        &self.exclude
    }

    /// Include patterns in command-line order.
    #[must_use]
    pub fn include_patterns(&self) -> &[FilterPattern] {
        &self.include
    }

    /// Decides whether the entry at `path` is filtered out.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        let mut excluded = false;
        for pattern in &self.exclude {
            if pattern.matches(path) {
                excluded = true;
            }
        }
        for pattern in &self.include {
            if pattern.matches(path) {
                excluded = false;
            }
        }
        excluded
    }
}

fn compile<T>(patterns: T) -> Result<Vec<FilterPattern>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| FilterPattern::parse(p.as_ref()))
        .collect()
}
