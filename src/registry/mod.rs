//! Route registry and request resolution.
//!
//! # Responsibilities
//! - Own all registered (Route, HandlerEndpoint) pairs
//! - Reject duplicate Route registration at startup
//! - Resolve a request to exactly one endpoint, or a structured failure
//!
//! # Design Decisions
//! - Immutable after registration; lookups take `&self` and need no locks
//! - Full-literal patterns feed a secondary exact-path index; pattern-only
//!   routes are found by the full scan fallback
//! - A tie between the two best matches is a fatal AmbiguousMapping,
//!   never resolved by registration order

mod endpoint;

pub use endpoint::{Handler, HandlerEndpoint, HandlerError, HandlerSignature};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;
use tracing::debug;

use crate::error::DispatchError;
use crate::request::RouteRequest;
use crate::route::Route;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route {route} is already mapped to '{existing}'")]
    DuplicateRoute { route: String, existing: String },
}

/// The per-request resolution result: the narrowed route (only the
/// sub-condition values that actually matched) and its endpoint.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Route,
    pub endpoint: Arc<HandlerEndpoint>,
}

/// Owns the route table. Built once at startup, then shared read-only
/// across request tasks.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    mappings: Vec<(Route, Arc<HandlerEndpoint>)>,
    literal_index: HashMap<String, Vec<usize>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = (&Route, &Arc<HandlerEndpoint>)> {
        self.mappings.iter().map(|(route, endpoint)| (route, endpoint))
    }

    /// Registers a route. An equal route already present is a
    /// configuration error: refusing it here is what lets `resolve` trust
    /// the one-to-one mapping.
    pub fn register(
        &mut self,
        route: Route,
        endpoint: HandlerEndpoint,
    ) -> Result<(), RegistryError> {
        if let Some((_, existing)) = self.mappings.iter().find(|(r, _)| *r == route) {
            return Err(RegistryError::DuplicateRoute {
                route: route.to_string(),
                existing: existing.name().to_string(),
            });
        }

        let index = self.mappings.len();
        for literal in route.literal_patterns() {
            self.literal_index
                .entry(literal.to_string())
                .or_default()
                .push(index);
        }

        debug!(route = %route, endpoint = endpoint.name(), "route registered");
        self.mappings.push((route, Arc::new(endpoint)));
        Ok(())
    }

    /// Resolves a request to its single best endpoint.
    ///
    /// Candidates come from the literal-path index when the lookup path is
    /// indexed; if that set yields no match the full table is scanned,
    /// which is what finds pattern-only routes. An empty match list
    /// classifies as MethodNotAllowed when at least one candidate failed
    /// on the method dimension alone, otherwise NoMatchingRoute.
    pub fn resolve(&self, request: &RouteRequest) -> Result<RouteMatch, DispatchError> {
        let path = request.path();

        let mut outcome = match self.literal_index.get(path) {
            Some(indices) => self.collect_matches(request, indices.iter().copied()),
            None => ScanOutcome::default(),
        };
        if outcome.matches.is_empty() {
            outcome = self.collect_matches(request, 0..self.mappings.len());
        }

        let ScanOutcome {
            mut matches,
            mut allowed_methods,
        } = outcome;

        if matches.is_empty() {
            if !allowed_methods.is_empty() {
                allowed_methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                allowed_methods.dedup();
                return Err(DispatchError::MethodNotAllowed {
                    path: path.to_string(),
                    method: request.method().clone(),
                    allowed: allowed_methods,
                });
            }
            return Err(DispatchError::NoMatchingRoute {
                path: path.to_string(),
            });
        }

        matches.sort_by(|a, b| a.0.compare(&b.0, request));

        if matches.len() >= 2 && matches[0].0.compare(&matches[1].0, request) == Ordering::Equal {
            return Err(DispatchError::AmbiguousMapping {
                path: path.to_string(),
                first: matches[0].1.name().to_string(),
                second: matches[1].1.name().to_string(),
            });
        }

        let (route, endpoint) = matches.swap_remove(0);
        debug!(path, endpoint = endpoint.name(), "request resolved");
        Ok(RouteMatch { route, endpoint })
    }

    fn collect_matches<I>(&self, request: &RouteRequest, indices: I) -> ScanOutcome
    where
        I: IntoIterator<Item = usize>,
    {
        let mut outcome = ScanOutcome::default();
        for index in indices {
            let (route, endpoint) = &self.mappings[index];
            match route.matching(request) {
                Ok(narrowed) => outcome.matches.push((narrowed, Arc::clone(endpoint))),
                Err(mismatch) if mismatch.method_only() => {
                    outcome
                        .allowed_methods
                        .extend(mismatch.declared_methods().iter().cloned());
                }
                Err(_) => {}
            }
        }
        outcome
    }
}

#[derive(Default)]
struct ScanOutcome {
    matches: Vec<(Route, Arc<HandlerEndpoint>)>,
    allowed_methods: Vec<Method>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ReturnValue, ReturnSpec};
    use axum::http::StatusCode;

    fn endpoint(name: &str) -> HandlerEndpoint {
        HandlerEndpoint::from_fn(
            name,
            HandlerSignature::new(Vec::new(), ReturnSpec::Status),
            |_args| async { Ok(ReturnValue::status(StatusCode::OK)) },
        )
    }

    fn request(method: Method, path: &str) -> RouteRequest {
        RouteRequest::new(method, path)
    }

    fn route(path: &str, method: Option<Method>) -> Route {
        let mut builder = Route::builder().path(path);
        if let Some(method) = method {
            builder = builder.method(method);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = MappingRegistry::new();
        registry
            .register(route("/jobs", Some(Method::GET)), endpoint("a"))
            .unwrap();

        let err = registry
            .register(route("/jobs", Some(Method::GET)), endpoint("b"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRoute { .. }));

        // Same path with another method is a distinct route
        registry
            .register(route("/jobs", Some(Method::POST)), endpoint("c"))
            .unwrap();
    }

    #[test]
    fn test_method_selection_is_registration_order_independent() {
        for flipped in [false, true] {
            let mut registry = MappingRegistry::new();
            let (first, second) = if flipped {
                (Method::POST, Method::GET)
            } else {
                (Method::GET, Method::POST)
            };
            registry
                .register(route("/a", Some(first.clone())), endpoint(first.as_str()))
                .unwrap();
            registry
                .register(route("/a", Some(second.clone())), endpoint(second.as_str()))
                .unwrap();

            let matched = registry.resolve(&request(Method::GET, "/a")).unwrap();
            assert_eq!(matched.endpoint.name(), "GET");
        }
    }

    #[test]
    fn test_method_not_allowed_carries_allowed_union() {
        let mut registry = MappingRegistry::new();
        registry
            .register(route("/a", Some(Method::GET)), endpoint("get"))
            .unwrap();
        registry
            .register(route("/a", Some(Method::POST)), endpoint("post"))
            .unwrap();

        let err = registry.resolve(&request(Method::DELETE, "/a")).unwrap_err();
        match err {
            DispatchError::MethodNotAllowed { allowed, .. } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn test_no_matching_route() {
        let mut registry = MappingRegistry::new();
        registry
            .register(route("/jobs", None), endpoint("jobs"))
            .unwrap();

        let err = registry
            .resolve(&request(Method::GET, "/missing"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoMatchingRoute { .. }));
    }

    #[test]
    fn test_literal_index_does_not_hide_pattern_routes() {
        let mut registry = MappingRegistry::new();
        // Literal route matches GET only; the pattern route takes POST
        registry
            .register(route("/jobs", Some(Method::GET)), endpoint("literal"))
            .unwrap();
        registry
            .register(route("/{section}", Some(Method::POST)), endpoint("pattern"))
            .unwrap();

        let matched = registry.resolve(&request(Method::POST, "/jobs")).unwrap();
        assert_eq!(matched.endpoint.name(), "pattern");
    }

    #[test]
    fn test_more_specific_pattern_wins() {
        let mut registry = MappingRegistry::new();
        registry
            .register(route("/jobs/**", None), endpoint("catchall"))
            .unwrap();
        registry
            .register(route("/jobs/{id}", None), endpoint("by-id"))
            .unwrap();

        let matched = registry.resolve(&request(Method::GET, "/jobs/42")).unwrap();
        assert_eq!(matched.endpoint.name(), "by-id");
        assert_eq!(matched.route.patterns(), ["/jobs/{id}"]);
    }

    #[test]
    fn test_exact_tie_is_ambiguous() {
        let mut registry = MappingRegistry::new();
        // Distinct routes (different params) that rank identically for a
        // request satisfying both
        registry
            .register(
                Route::builder().path("/jobs").param("a").build().unwrap(),
                endpoint("first"),
            )
            .unwrap();
        registry
            .register(
                Route::builder().path("/jobs").param("b").build().unwrap(),
                endpoint("second"),
            )
            .unwrap();

        let err = registry
            .resolve(&request(Method::GET, "/jobs?a=1&b=2"))
            .unwrap_err();
        match &err {
            DispatchError::AmbiguousMapping { first, second, .. } => {
                assert_ne!(first, second);
            }
            other => panic!("expected AmbiguousMapping, got {other:?}"),
        }
        assert!(err.is_fatal());
    }
}
