//! Path-pattern condition.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::path::{self, PathMatcher, SegmentMatcher};
use crate::request::RouteRequest;

/// The declared path patterns of a route. Empty matches any path.
/// Narrowing keeps the patterns that matched the lookup path, sorted most
/// specific first, so the head of the list is "the pattern that fired".
#[derive(Debug, Clone)]
pub struct PatternsCondition {
    patterns: Vec<String>,
    matcher: Arc<dyn PathMatcher>,
}

impl Default for PatternsCondition {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), Arc::new(SegmentMatcher))
    }
}

impl PatternsCondition {
    pub fn new<I, S>(patterns: I, matcher: Arc<dyn PathMatcher>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for pattern in patterns {
            let pattern = normalize(pattern.into());
            if !out.contains(&pattern) {
                out.push(pattern);
            }
        }
        Self { patterns: out, matcher }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Full-literal patterns, usable as exact-lookup index keys.
    pub fn literal_patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .filter(|p| path::is_literal(p))
    }

    pub fn matcher(&self) -> &Arc<dyn PathMatcher> {
        &self.matcher
    }

    /// empty x empty = empty; empty x X = X; X x Y = cartesian product of
    /// path-joined patterns.
    pub fn combine(&self, other: &Self) -> Self {
        let combined: Vec<String> = if self.patterns.is_empty() {
            other.patterns.clone()
        } else if other.patterns.is_empty() {
            self.patterns.clone()
        } else {
            self.patterns
                .iter()
                .flat_map(|parent| {
                    other
                        .patterns
                        .iter()
                        .map(|child| self.matcher.combine(parent, child))
                })
                .collect()
        };
        Self::new(combined, self.matcher.clone())
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        if self.patterns.is_empty() {
            return Some(self.clone());
        }
        let path = request.path();
        let mut matched: Vec<String> = self
            .patterns
            .iter()
            .filter(|pattern| self.matcher.matches(pattern, path))
            .cloned()
            .collect();
        if matched.is_empty() {
            return None;
        }
        matched.sort_by(|a, b| self.matcher.compare(a, b, path));
        Some(Self {
            patterns: matched,
            matcher: self.matcher.clone(),
        })
    }

    /// Pairwise comparison of the (already best-first) matched patterns;
    /// if one side has equally ranked patterns left over, it wins.
    pub fn compare(&self, other: &Self, request: &RouteRequest) -> Ordering {
        let path = request.path();
        let mut ours = self.patterns.iter();
        let mut theirs = other.patterns.iter();
        loop {
            match (ours.next(), theirs.next()) {
                (Some(a), Some(b)) => {
                    let ranked = self.matcher.compare(a, b, path);
                    if ranked != Ordering::Equal {
                        return ranked;
                    }
                }
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            }
        }
    }
}

fn normalize(pattern: String) -> String {
    if pattern.is_empty() || pattern.starts_with('/') {
        pattern
    } else {
        format!("/{pattern}")
    }
}

// Equality and hashing are over the declared patterns only; the matcher is
// a collaborator, not part of the route's identity.
impl PartialEq for PatternsCondition {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for PatternsCondition {}

impl Hash for PatternsCondition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.patterns.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn condition(patterns: &[&str]) -> PatternsCondition {
        PatternsCondition::new(patterns.iter().copied(), Arc::new(SegmentMatcher))
    }

    #[test]
    fn test_empty_matches_any_path() {
        let request = RouteRequest::new(Method::GET, "/anything/at/all");
        assert!(condition(&[]).matching(&request).is_some());
    }

    #[test]
    fn test_narrowing_sorts_best_first() {
        let request = RouteRequest::new(Method::GET, "/jobs/42");
        let narrowed = condition(&["/jobs/**", "/jobs/{id}", "/jobs/*"])
            .matching(&request)
            .unwrap();
        assert_eq!(
            narrowed.patterns(),
            ["/jobs/{id}", "/jobs/*", "/jobs/**"]
        );
    }

    #[test]
    fn test_combine_cartesian() {
        let parent = condition(&["/api", "/admin"]);
        let child = condition(&["/jobs", "/health"]);
        let combined = parent.combine(&child);
        assert_eq!(
            combined.patterns(),
            ["/api/jobs", "/api/health", "/admin/jobs", "/admin/health"]
        );
    }

    #[test]
    fn test_combine_empty_sides() {
        let empty = condition(&[]);
        let child = condition(&["/jobs"]);
        assert_eq!(empty.combine(&child).patterns(), ["/jobs"]);
        assert_eq!(child.combine(&empty).patterns(), ["/jobs"]);
        assert!(empty.combine(&empty).is_empty());
    }

    #[test]
    fn test_literal_patterns() {
        let c = condition(&["/jobs", "/jobs/{id}", "/static/**"]);
        let literals: Vec<&str> = c.literal_patterns().collect();
        assert_eq!(literals, ["/jobs"]);
    }
}
