//! HTTP method condition.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use axum::http::Method;

use crate::request::RouteRequest;

/// The declared method set of a route. Empty means any method. Narrowing
/// reduces the set to the single method that matched, so comparing two
/// narrowed conditions only has to distinguish "explicit method" from
/// "matched by being empty".
#[derive(Debug, Clone, Default)]
pub struct MethodsCondition {
    methods: Vec<Method>,
}

impl MethodsCondition {
    pub fn new<I: IntoIterator<Item = Method>>(methods: I) -> Self {
        let mut methods: Vec<Method> = methods.into_iter().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods.dedup();
        Self { methods }
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Structural union: a class-level GET combined with a method-level
    /// POST yields {GET, POST}.
    pub fn combine(&self, other: &Self) -> Self {
        Self::new(self.methods.iter().chain(other.methods.iter()).cloned())
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        if self.methods.is_empty() {
            return Some(self.clone());
        }
        self.methods
            .contains(request.method())
            .then(|| Self::new([request.method().clone()]))
    }

    /// On narrowed conditions a non-empty set holds exactly the matched
    /// method; it outranks a condition that only matched by being empty.
    pub fn compare(&self, other: &Self) -> Ordering {
        other.methods.len().cmp(&self.methods.len())
    }
}

impl PartialEq for MethodsCondition {
    fn eq(&self, other: &Self) -> bool {
        self.methods == other.methods
    }
}

impl Eq for MethodsCondition {}

impl Hash for MethodsCondition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for method in &self.methods {
            method.as_str().hash(state);
        }
    }
}
