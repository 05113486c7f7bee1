//! Command-line path filtering.
//!
//! - [`FilterPattern`]: one glob, matched against a path and its ancestors
//! - [`FilterSet`]: exclude patterns with include overrides

pub mod chain;
pub mod matcher;

pub use chain::FilterSet;
pub use matcher::FilterPattern;
pub use matcher::match_glob_parents;
