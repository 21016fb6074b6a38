//! Path pattern matching collaborator.
//!
//! # Responsibilities
//! - Match a path pattern against a request path
//! - Extract `{var}` template variables from a matched pattern
//! - Rank patterns by specificity for tie-breaking
//! - Join class-level and method-level patterns
//!
//! # Design Decisions
//! - Matching is segment-based, case-sensitive, no regex (O(n) guarantee)
//! - `*` matches exactly one segment, `**` (final segment only) matches any
//!   remainder, `{name}` matches one segment and captures it
//! - The trait is the seam: callers may plug in a different matcher, the
//!   conditions and registry only see `dyn PathMatcher`

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Capability contract for the path-matching collaborator.
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// Returns true if `path` matches `pattern`.
    fn matches(&self, pattern: &str, path: &str) -> bool;

    /// Extracts `{var}` values from a pattern known to match `path`.
    /// Unmatched patterns yield an empty map.
    fn extract(&self, pattern: &str, path: &str) -> BTreeMap<String, String>;

    /// Joins a parent and child pattern, collapsing duplicate separators.
    fn combine(&self, parent: &str, child: &str) -> String {
        combine_patterns(parent, child)
    }

    /// Ranks two patterns for a given lookup path, most specific first.
    fn compare(&self, a: &str, b: &str, lookup_path: &str) -> Ordering {
        compare_patterns(a, b, lookup_path)
    }
}

/// True when the pattern contains no wildcard or template segment and can
/// therefore be used as a literal index key.
pub fn is_literal(pattern: &str) -> bool {
    !pattern.contains('*') && !pattern.contains('{')
}

/// Joins two patterns: empty x empty = empty, empty x X = X, X x Y = X/Y
/// with duplicate `/` collapsed at the join point.
pub fn combine_patterns(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return child.to_string();
    }
    if child.is_empty() {
        return parent.to_string();
    }
    format!(
        "{}/{}",
        parent.trim_end_matches('/'),
        child.trim_start_matches('/')
    )
}

/// Specificity ranking, best pattern first:
/// exact literal match, then fewer wildcard segments, then fewer template
/// variables, then longer literal prefix, then shorter overall pattern.
pub fn compare_patterns(a: &str, b: &str, lookup_path: &str) -> Ordering {
    let exact_a = a == lookup_path;
    let exact_b = b == lookup_path;
    if exact_a != exact_b {
        return if exact_a { Ordering::Less } else { Ordering::Greater };
    }

    let info_a = PatternInfo::of(a);
    let info_b = PatternInfo::of(b);

    info_a
        .wildcards
        .cmp(&info_b.wildcards)
        .then_with(|| info_a.variables.cmp(&info_b.variables))
        .then_with(|| info_b.literal_prefix.cmp(&info_a.literal_prefix))
        .then_with(|| info_a.length.cmp(&info_b.length))
}

struct PatternInfo {
    wildcards: usize,
    variables: usize,
    literal_prefix: usize,
    length: usize,
}

impl PatternInfo {
    fn of(pattern: &str) -> Self {
        let wildcards = segments(pattern)
            .filter(|s| *s == "*" || *s == "**")
            .count();
        let variables = segments(pattern).filter(|s| is_template(s)).count();
        let literal_prefix = pattern
            .find(['*', '{'])
            .unwrap_or(pattern.len());
        Self {
            wildcards,
            variables,
            literal_prefix,
            length: pattern.len(),
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_template(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2
}

fn segment_matches(pattern_segment: &str, path_segment: &str) -> bool {
    pattern_segment == "*" || is_template(pattern_segment) || pattern_segment == path_segment
}

/// Default segment-based matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentMatcher;

impl PathMatcher for SegmentMatcher {
    fn matches(&self, pattern: &str, path: &str) -> bool {
        let pat: Vec<&str> = segments(pattern).collect();
        let pth: Vec<&str> = segments(path).collect();

        if pat.last() == Some(&"**") {
            let prefix = &pat[..pat.len() - 1];
            if pth.len() < prefix.len() {
                return false;
            }
            return prefix
                .iter()
                .zip(pth.iter())
                .all(|(p, s)| segment_matches(p, s));
        }

        pat.len() == pth.len()
            && pat
                .iter()
                .zip(pth.iter())
                .all(|(p, s)| segment_matches(p, s))
    }

    fn extract(&self, pattern: &str, path: &str) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        if !self.matches(pattern, path) {
            return vars;
        }
        for (p, s) in segments(pattern).zip(segments(path)) {
            if is_template(p) {
                let name = &p[1..p.len() - 1];
                vars.insert(name.to_string(), s.to_string());
            }
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let m = SegmentMatcher;
        assert!(m.matches("/jobs", "/jobs"));
        assert!(!m.matches("/jobs", "/jobs/1"));
        assert!(!m.matches("/jobs", "/Jobs")); // case sensitive
    }

    #[test]
    fn test_wildcard_segments() {
        let m = SegmentMatcher;
        assert!(m.matches("/jobs/*", "/jobs/123"));
        assert!(!m.matches("/jobs/*", "/jobs/123/logs"));
        assert!(m.matches("/jobs/**", "/jobs/123/logs"));
        assert!(m.matches("/jobs/**", "/jobs"));
        assert!(!m.matches("/jobs/**", "/other"));
    }

    #[test]
    fn test_template_extraction() {
        let m = SegmentMatcher;
        assert!(m.matches("/jobs/{id}/logs/{line}", "/jobs/42/logs/7"));

        let vars = m.extract("/jobs/{id}/logs/{line}", "/jobs/42/logs/7");
        assert_eq!(vars.get("id").map(String::as_str), Some("42"));
        assert_eq!(vars.get("line").map(String::as_str), Some("7"));

        assert!(m.extract("/jobs/{id}", "/other/42").is_empty());
    }

    #[test]
    fn test_combine_patterns() {
        assert_eq!(combine_patterns("", ""), "");
        assert_eq!(combine_patterns("", "/jobs"), "/jobs");
        assert_eq!(combine_patterns("/api", ""), "/api");
        assert_eq!(combine_patterns("/api", "/jobs"), "/api/jobs");
        assert_eq!(combine_patterns("/api/", "/jobs"), "/api/jobs");
    }

    #[test]
    fn test_specificity_ranking() {
        let lookup = "/jobs/42";

        // Exact literal beats everything
        assert_eq!(
            compare_patterns("/jobs/42", "/jobs/{id}", lookup),
            Ordering::Less
        );
        // Template beats single-segment wildcard (fewer wildcards)
        assert_eq!(
            compare_patterns("/jobs/{id}", "/jobs/*", lookup),
            Ordering::Less
        );
        // Longer literal prefix wins among equal wildcard counts
        assert_eq!(
            compare_patterns("/jobs/*", "/*/42", lookup),
            Ordering::Less
        );
        // Shorter pattern wins as final tie-break
        assert_eq!(
            compare_patterns("/jobs/*", "/jobs/**", lookup),
            Ordering::Less
        );
    }
}
