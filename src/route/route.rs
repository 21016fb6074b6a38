//! The route composite: one immutable bundle of match conditions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use super::custom::{CustomConditionHolder, CustomPredicate};
use super::expr::{HeadersCondition, ParamsCondition};
use super::media::{ConsumesCondition, ProducesCondition};
use super::methods::MethodsCondition;
use super::patterns::PatternsCondition;
use crate::media::{MediaRange, MediaRangeError};
use crate::path::{PathMatcher, SegmentMatcher};
use crate::request::RouteRequest;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route declares an invalid media type: {0}")]
    InvalidMediaType(#[from] MediaRangeError),
}

/// The dimension of a route that failed to match, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Methods,
    Params,
    Headers,
    Consumes,
    Produces,
    Patterns,
    Custom,
}

/// Why a route did not match. Every dimension is evaluated so the registry
/// can tell a pure method mismatch (405 material) apart from any other
/// failure.
#[derive(Debug, Clone)]
pub struct RouteMismatch {
    failed: Vec<Dimension>,
    declared_methods: Vec<Method>,
}

impl RouteMismatch {
    /// True when the method set was the only dimension that rejected the
    /// request.
    pub fn method_only(&self) -> bool {
        self.failed == [Dimension::Methods]
    }

    pub fn failed_dimensions(&self) -> &[Dimension] {
        &self.failed
    }

    /// The methods this route would have accepted; meaningful when
    /// `method_only()` holds.
    pub fn declared_methods(&self) -> &[Method] {
        &self.declared_methods
    }
}

/// An immutable set of request-match conditions bound to one handler. An
/// empty sub-condition matches anything on that dimension; two routes are
/// equal iff all sub-conditions are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    patterns: PatternsCondition,
    methods: MethodsCondition,
    params: ParamsCondition,
    headers: HeadersCondition,
    consumes: ConsumesCondition,
    produces: ProducesCondition,
    custom: CustomConditionHolder,
}

impl Route {
    pub fn builder() -> RouteBuilder {
        RouteBuilder::default()
    }

    pub fn patterns(&self) -> &[String] {
        self.patterns.patterns()
    }

    pub fn literal_patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.literal_patterns()
    }

    pub fn path_matcher(&self) -> &Arc<dyn PathMatcher> {
        self.patterns.matcher()
    }

    pub fn methods(&self) -> &[Method] {
        self.methods.methods()
    }

    pub fn consumes(&self) -> &[MediaRange] {
        self.consumes.ranges()
    }

    /// On a narrowed route this is the producible subset the negotiation
    /// engine works from.
    pub fn produces(&self) -> &[MediaRange] {
        self.produces.ranges()
    }

    /// Merges a parent-level and a child-level declaration into one route.
    pub fn combine(&self, other: &Route) -> Route {
        Route {
            patterns: self.patterns.combine(&other.patterns),
            methods: self.methods.combine(&other.methods),
            params: self.params.combine(&other.params),
            headers: self.headers.combine(&other.headers),
            consumes: self.consumes.combine(&other.consumes),
            produces: self.produces.combine(&other.produces),
            custom: self.custom.combine(&other.custom),
        }
    }

    /// Evaluates all sub-conditions against the request. On success the
    /// result is a narrowed copy: matched patterns sorted best-first,
    /// produces reduced to the Accept-compatible subset, the method set
    /// reduced to the method that fired.
    ///
    /// Dimensions are checked in cost-ascending order, but every dimension
    /// is evaluated even after a failure: the registry needs to know
    /// whether the method set was the *only* objection.
    pub fn matching(&self, request: &RouteRequest) -> Result<Route, RouteMismatch> {
        let mut failed = Vec::new();

        let methods = self.methods.matching(request);
        if methods.is_none() {
            failed.push(Dimension::Methods);
        }
        let params = self.params.matching(request);
        if params.is_none() {
            failed.push(Dimension::Params);
        }
        let headers = self.headers.matching(request);
        if headers.is_none() {
            failed.push(Dimension::Headers);
        }
        let consumes = self.consumes.matching(request);
        if consumes.is_none() {
            failed.push(Dimension::Consumes);
        }
        let produces = self.produces.matching(request);
        if produces.is_none() {
            failed.push(Dimension::Produces);
        }
        let patterns = self.patterns.matching(request);
        if patterns.is_none() {
            failed.push(Dimension::Patterns);
        }
        let custom = self.custom.matching(request);
        if custom.is_none() {
            failed.push(Dimension::Custom);
        }

        if !failed.is_empty() {
            return Err(RouteMismatch {
                failed,
                declared_methods: self.methods.methods().to_vec(),
            });
        }

        Ok(Route {
            patterns: patterns.expect("checked above"),
            methods: methods.expect("checked above"),
            params: params.expect("checked above"),
            headers: headers.expect("checked above"),
            consumes: consumes.expect("checked above"),
            produces: produces.expect("checked above"),
            custom: custom.expect("checked above"),
        })
    }

    /// Lexicographic specificity comparison between two routes both
    /// narrowed against the same request; `Less` means `self` is the
    /// better match. `Equal` across every dimension is the ambiguity
    /// signal the registry acts on.
    pub fn compare(&self, other: &Route, request: &RouteRequest) -> Ordering {
        self.patterns
            .compare(&other.patterns, request)
            .then_with(|| other.params.len().cmp(&self.params.len()))
            .then_with(|| other.headers.len().cmp(&self.headers.len()))
            .then_with(|| self.consumes.compare(&other.consumes))
            .then_with(|| self.produces.compare(&other.produces, request))
            .then_with(|| self.methods.compare(&other.methods))
            .then_with(|| self.custom.compare(&other.custom, request))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{patterns={:?}", self.patterns.patterns())?;
        if !self.methods.is_empty() {
            write!(f, ", methods={:?}", self.methods.methods())?;
        }
        if !self.consumes.is_empty() {
            let consumes: Vec<String> =
                self.consumes.ranges().iter().map(|r| r.to_string()).collect();
            write!(f, ", consumes={consumes:?}")?;
        }
        if !self.produces.is_empty() {
            let produces: Vec<String> =
                self.produces.ranges().iter().map(|r| r.to_string()).collect();
            write!(f, ", produces={produces:?}")?;
        }
        f.write_str("}")
    }
}

/// Builder for [`Route`]. Media-type declarations are validated at
/// `build()`, so malformed routes fail at registration, not per request.
pub struct RouteBuilder {
    matcher: Arc<dyn PathMatcher>,
    paths: Vec<String>,
    methods: Vec<Method>,
    params: Vec<String>,
    headers: Vec<String>,
    consumes: Vec<String>,
    produces: Vec<String>,
    custom: Option<Arc<dyn CustomPredicate>>,
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self {
            matcher: Arc::new(SegmentMatcher),
            paths: Vec::new(),
            methods: Vec::new(),
            params: Vec::new(),
            headers: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            custom: None,
        }
    }
}

impl RouteBuilder {
    pub fn path(mut self, pattern: impl Into<String>) -> Self {
        self.paths.push(pattern.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn param(mut self, expression: impl Into<String>) -> Self {
        self.params.push(expression.into());
        self
    }

    pub fn header(mut self, expression: impl Into<String>) -> Self {
        self.headers.push(expression.into());
        self
    }

    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes.push(media_type.into());
        self
    }

    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces.push(media_type.into());
        self
    }

    pub fn custom(mut self, predicate: Arc<dyn CustomPredicate>) -> Self {
        self.custom = Some(predicate);
        self
    }

    /// Substitute a different path-matching collaborator.
    pub fn path_matcher(mut self, matcher: Arc<dyn PathMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn build(self) -> Result<Route, RouteError> {
        let consumes = self
            .consumes
            .iter()
            .map(|v| MediaRange::parse(v))
            .collect::<Result<Vec<_>, _>>()?;
        let produces = self
            .produces
            .iter()
            .map(|v| MediaRange::parse(v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Route {
            patterns: PatternsCondition::new(self.paths, self.matcher),
            methods: MethodsCondition::new(self.methods),
            params: ParamsCondition::new(self.params),
            headers: HeadersCondition::new(self.headers),
            consumes: ConsumesCondition::new(consumes),
            produces: ProducesCondition::new(produces),
            custom: CustomConditionHolder::new(self.custom),
        })
    }
}
