//! Opaque custom route predicate.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::request::RouteRequest;

/// A caller-supplied predicate attached to a route in addition to the
/// built-in dimensions. Identity (for route equality and duplicate
/// detection) is the descriptor string.
pub trait CustomPredicate: Send + Sync + fmt::Debug {
    /// Stable identity, also used in log/error output.
    fn descriptor(&self) -> String;

    fn matches(&self, request: &RouteRequest) -> bool;

    /// Combine contract when both a parent and a child declaration carry a
    /// predicate. The default lets the child's predicate win, mirroring
    /// the consumes/produces override rule.
    fn combine(self: Arc<Self>, other: Arc<dyn CustomPredicate>) -> Arc<dyn CustomPredicate> {
        other
    }

    /// Relative specificity against another predicate; `Equal` unless the
    /// predicate defines its own ordering.
    fn compare(&self, _other: &dyn CustomPredicate, _request: &RouteRequest) -> Ordering {
        Ordering::Equal
    }
}

/// Holds the optional custom predicate so the route itself never has to
/// deal with the absent case.
#[derive(Debug, Clone, Default)]
pub struct CustomConditionHolder {
    predicate: Option<Arc<dyn CustomPredicate>>,
}

impl CustomConditionHolder {
    pub fn new(predicate: Option<Arc<dyn CustomPredicate>>) -> Self {
        Self { predicate }
    }

    pub fn is_empty(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn combine(&self, other: &Self) -> Self {
        let predicate = match (&self.predicate, &other.predicate) {
            (Some(ours), Some(theirs)) => Some(ours.clone().combine(theirs.clone())),
            (Some(ours), None) => Some(ours.clone()),
            (None, theirs) => theirs.clone(),
        };
        Self { predicate }
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        match &self.predicate {
            None => Some(self.clone()),
            Some(predicate) => predicate.matches(request).then(|| self.clone()),
        }
    }

    pub fn compare(&self, other: &Self, request: &RouteRequest) -> Ordering {
        match (&self.predicate, &other.predicate) {
            (Some(ours), Some(theirs)) => ours.compare(theirs.as_ref(), request),
            _ => Ordering::Equal,
        }
    }

    fn descriptor(&self) -> Option<String> {
        self.predicate.as_ref().map(|p| p.descriptor())
    }
}

impl PartialEq for CustomConditionHolder {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor() == other.descriptor()
    }
}

impl Eq for CustomConditionHolder {}

impl Hash for CustomConditionHolder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[derive(Debug)]
    struct RequiresQuery(&'static str);

    impl CustomPredicate for RequiresQuery {
        fn descriptor(&self) -> String {
            format!("requires-query:{}", self.0)
        }

        fn matches(&self, request: &RouteRequest) -> bool {
            request.has_query(self.0)
        }
    }

    #[test]
    fn test_holder_delegates_to_predicate() {
        let holder = CustomConditionHolder::new(Some(Arc::new(RequiresQuery("token"))));

        let hit = RouteRequest::new(Method::GET, "/jobs?token=x");
        assert!(holder.matching(&hit).is_some());

        let miss = RouteRequest::new(Method::GET, "/jobs");
        assert!(holder.matching(&miss).is_none());
    }

    #[test]
    fn test_empty_holder_always_matches() {
        let holder = CustomConditionHolder::default();
        let request = RouteRequest::new(Method::GET, "/jobs");
        assert!(holder.matching(&request).is_some());
    }

    #[test]
    fn test_combine_prefers_child() {
        let parent = CustomConditionHolder::new(Some(Arc::new(RequiresQuery("a"))));
        let child = CustomConditionHolder::new(Some(Arc::new(RequiresQuery("b"))));
        assert_eq!(parent.combine(&child), child);
        assert_eq!(parent.combine(&CustomConditionHolder::default()), parent);
    }
}
