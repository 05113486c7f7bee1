//! Property-based tests for filter matching and size formatting.
//!
//! The matcher is checked against a direct restatement of its contract
//! built on `glob::Pattern`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use glob::MatchOptions;
use glob::Pattern;
use proptest::prelude::*;
use unpak_core::FilterSet;
use unpak_core::filter::FilterPattern;
use unpak_core::format_bytes_si;

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-c]{1,3}", 1..5).prop_map(|parts| parts.join("/"))
}

fn pattern_strategy() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        "[a-c]{1,3}",
        Just("*".to_string()),
        Just("?".to_string()),
        Just("[ab]*".to_string()),
        Just("*c".to_string()),
    ];
    prop::collection::vec(segment, 1..3).prop_map(|parts| parts.join("/"))
}

/// `p` and every ancestor directory of `p`, longest first.
fn prefixes(path: &str) -> Vec<&str> {
    let mut out = vec![path];
    out.extend(path.match_indices('/').map(|(i, _)| &path[..i]).rev());
    out
}

fn glob_matches(pattern: &str, name: &str) -> bool {
    Pattern::new(pattern).unwrap().matches_with(name, OPTIONS)
}

proptest! {
    /// Anchored patterns only ever see the path or one of its ancestors.
    #[test]
    fn prop_anchored_matches_path_or_ancestor(
        pattern in pattern_strategy(),
        path in path_strategy(),
    ) {
        let compiled = FilterPattern::parse(&format!("/{pattern}")).unwrap();
        let expected = prefixes(&path).iter().any(|q| glob_matches(&pattern, q));
        prop_assert_eq!(compiled.matches(&path), expected);
    }

    /// Unanchored patterns also see the bare name of the path and of every
    /// ancestor.
    #[test]
    fn prop_unanchored_matches_prefix_or_component(
        pattern in pattern_strategy(),
        path in path_strategy(),
    ) {
        let compiled = FilterPattern::parse(&pattern).unwrap();
        let expected = prefixes(&path).iter().any(|q| glob_matches(&pattern, q))
            || path.split('/').any(|component| glob_matches(&pattern, component));
        prop_assert_eq!(compiled.matches(&path), expected);
    }

    /// Anything an anchored pattern matches, its unanchored twin matches.
    #[test]
    fn prop_anchoring_only_narrows(
        pattern in pattern_strategy(),
        path in path_strategy(),
    ) {
        let anchored = FilterPattern::parse(&format!("/{pattern}")).unwrap();
        let unanchored = FilterPattern::parse(&pattern).unwrap();
        prop_assert!(!anchored.matches(&path) || unanchored.matches(&path));
    }

    /// A directory match covers everything below it.
    #[test]
    fn prop_match_is_inherited_by_descendants(
        pattern in pattern_strategy(),
        path in path_strategy(),
        tail in path_strategy(),
    ) {
        let compiled = FilterPattern::parse(&pattern).unwrap();
        if compiled.matches(&path) {
            let child = format!("{path}/{tail}");
            prop_assert!(compiled.matches(&child));
        }
    }

    /// Excluded iff some exclude matches and no include matches, whatever
    /// the order of either list.
    #[test]
    fn prop_exclusion_is_order_independent(
        exclude in prop::collection::vec(pattern_strategy(), 0..4),
        include in prop::collection::vec(pattern_strategy(), 0..4),
        path in path_strategy(),
    ) {
        let matches = |patterns: &[String]| {
            patterns
                .iter()
                .any(|p| FilterPattern::parse(p).unwrap().matches(&path))
        };
        let expected = matches(&exclude) && !matches(&include);

        let forward = FilterSet::new(&exclude, &include).unwrap();
        prop_assert_eq!(forward.is_excluded(&path), expected);

        let reversed = FilterSet::new(exclude.iter().rev(), include.iter().rev()).unwrap();
        prop_assert_eq!(reversed.is_excluded(&path), expected);
    }

    /// Negative sizes are their magnitude with a sign.
    #[test]
    fn prop_negative_sizes_mirror_positive(n in 1..i64::MAX) {
        prop_assert_eq!(format_bytes_si(-n), format!("-{}", format_bytes_si(n)));
    }

    /// Sizes of a thousand bytes or more carry exactly one decimal.
    #[test]
    fn prop_scaled_sizes_have_one_decimal(n in 1000..i64::MAX) {
        let formatted = format_bytes_si(n);
        let number = formatted.split(' ').next().unwrap();
        let (_, fraction) = number.split_once('.').unwrap();
        prop_assert_eq!(fraction.len(), 1);
        prop_assert!(formatted.ends_with("B"));
    }
}
