//! Query-param and header predicate expressions.
//!
//! Expression grammar, matching the declaration syntax routes are built
//! with: `name` (present), `!name` (absent), `name=value` (present and
//! equal), `name!=value` (absent or different).

use std::collections::BTreeSet;
use std::fmt;

use crate::request::RouteRequest;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameValueExpr {
    pub name: String,
    pub value: Option<String>,
    pub negated: bool,
}

impl NameValueExpr {
    pub fn parse(expression: &str) -> Self {
        let expression = expression.trim();
        if let Some((name, value)) = expression.split_once("!=") {
            return Self {
                name: name.trim().to_string(),
                value: Some(value.trim().to_string()),
                negated: true,
            };
        }
        if let Some((name, value)) = expression.split_once('=') {
            return Self {
                name: name.trim().to_string(),
                value: Some(value.trim().to_string()),
                negated: false,
            };
        }
        if let Some(name) = expression.strip_prefix('!') {
            return Self {
                name: name.trim().to_string(),
                value: None,
                negated: true,
            };
        }
        Self {
            name: expression.to_string(),
            value: None,
            negated: false,
        }
    }

    /// Header names are case-insensitive; normalize at parse time.
    pub fn parse_header(expression: &str) -> Self {
        let mut expr = Self::parse(expression);
        expr.name = expr.name.to_lowercase();
        expr
    }

    /// Evaluates the expression against the actual value of the named
    /// param/header, `None` meaning absent.
    pub fn evaluate(&self, actual: Option<&str>) -> bool {
        let holds = match (&self.value, actual) {
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
            (None, actual) => actual.is_some(),
        };
        holds != self.negated
    }
}

impl fmt::Display for NameValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.negated) {
            (Some(value), true) => write!(f, "{}!={}", self.name, value),
            (Some(value), false) => write!(f, "{}={}", self.name, value),
            (None, true) => write!(f, "!{}", self.name),
            (None, false) => f.write_str(&self.name),
        }
    }
}

/// Query-parameter predicates. Empty set matches any request; more
/// expressions rank as more specific.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParamsCondition {
    expressions: BTreeSet<NameValueExpr>,
}

impl ParamsCondition {
    pub fn new<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            expressions: expressions
                .into_iter()
                .map(|e| NameValueExpr::parse(e.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn expressions(&self) -> impl Iterator<Item = &NameValueExpr> {
        self.expressions.iter()
    }

    /// Structural union: both sides' predicates must eventually hold.
    pub fn combine(&self, other: &Self) -> Self {
        let mut expressions = self.expressions.clone();
        expressions.extend(other.expressions.iter().cloned());
        Self { expressions }
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        let all_hold = self
            .expressions
            .iter()
            .all(|expr| expr.evaluate(request.query_value(&expr.name)));
        all_hold.then(|| self.clone())
    }
}

/// Header predicates. Accept and Content-Type expressions are not
/// representable here; those dimensions belong to produces/consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HeadersCondition {
    expressions: BTreeSet<NameValueExpr>,
}

impl HeadersCondition {
    pub fn new<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            expressions: expressions
                .into_iter()
                .map(|e| NameValueExpr::parse_header(e.as_ref()))
                .filter(|e| e.name != "accept" && e.name != "content-type")
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn combine(&self, other: &Self) -> Self {
        let mut expressions = self.expressions.clone();
        expressions.extend(other.expressions.iter().cloned());
        Self { expressions }
    }

    pub fn matching(&self, request: &RouteRequest) -> Option<Self> {
        let all_hold = self
            .expressions
            .iter()
            .all(|expr| expr.evaluate(request.header_value(&expr.name)));
        all_hold.then(|| self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_expression_parsing() {
        let expr = NameValueExpr::parse("state=running");
        assert_eq!(expr.name, "state");
        assert_eq!(expr.value.as_deref(), Some("running"));
        assert!(!expr.negated);

        let expr = NameValueExpr::parse("state!=done");
        assert!(expr.negated);
        assert_eq!(expr.value.as_deref(), Some("done"));

        let expr = NameValueExpr::parse("!debug");
        assert!(expr.negated);
        assert!(expr.value.is_none());

        let expr = NameValueExpr::parse("debug");
        assert!(!expr.negated);
    }

    #[test]
    fn test_expression_evaluation() {
        assert!(NameValueExpr::parse("a=1").evaluate(Some("1")));
        assert!(!NameValueExpr::parse("a=1").evaluate(Some("2")));
        assert!(!NameValueExpr::parse("a=1").evaluate(None));

        // Negated value: absent or different both hold
        assert!(NameValueExpr::parse("a!=1").evaluate(Some("2")));
        assert!(NameValueExpr::parse("a!=1").evaluate(None));
        assert!(!NameValueExpr::parse("a!=1").evaluate(Some("1")));

        assert!(NameValueExpr::parse("a").evaluate(Some("anything")));
        assert!(!NameValueExpr::parse("a").evaluate(None));
        assert!(NameValueExpr::parse("!a").evaluate(None));
    }

    #[test]
    fn test_params_condition() {
        let condition = ParamsCondition::new(["state=running", "verbose"]);

        let hit = RouteRequest::new(Method::GET, "/jobs?state=running&verbose=1");
        assert!(condition.matching(&hit).is_some());

        let miss = RouteRequest::new(Method::GET, "/jobs?state=done&verbose=1");
        assert!(condition.matching(&miss).is_none());

        // Empty condition matches anything
        let any = ParamsCondition::default();
        assert!(any.matching(&miss).is_some());
    }

    #[test]
    fn test_headers_condition_case_insensitive_names() {
        let condition = HeadersCondition::new(["X-Routebox-Tenant"]);
        let request =
            RouteRequest::new(Method::GET, "/jobs").with_header("x-routebox-tenant", "acme");
        assert!(condition.matching(&request).is_some());
    }

    #[test]
    fn test_headers_condition_drops_negotiation_headers() {
        let condition = HeadersCondition::new(["Accept=application/json", "X-Flag"]);
        assert_eq!(condition.len(), 1);
    }
}
