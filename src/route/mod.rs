//! Route condition model.
//!
//! A [`Route`] is an immutable composite of per-dimension sub-conditions
//! (path patterns, methods, query params, headers, consumable and
//! producible media types, plus an optional custom predicate). The three
//! operations every dimension participates in:
//!
//! - `combine` merges a parent-level and child-level declaration,
//! - `matching` narrows the condition against one request or rejects it,
//! - `compare` ranks two narrowed conditions for tie-breaking.
//!
//! An empty sub-condition always means "matches anything" on that
//! dimension.

mod custom;
mod expr;
mod media;
mod methods;
mod patterns;
mod route;

pub use custom::{CustomConditionHolder, CustomPredicate};
pub use expr::{HeadersCondition, NameValueExpr, ParamsCondition};
pub use media::{ConsumesCondition, ProducesCondition};
pub use methods::MethodsCondition;
pub use patterns::PatternsCondition;
pub use route::{Dimension, Route, RouteBuilder, RouteError, RouteMismatch};
