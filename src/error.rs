//! Dispatch failure taxonomy.
//!
//! Request-scoped failures (no route, method not allowed, unsupported or
//! unacceptable media) are ordinary per-request results. Ambiguous
//! mappings and configuration gaps are registration bugs: they abort
//! startup when detected there, and map to 500 if they first surface at
//! request time.

use axum::http::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches {path}")]
    NoMatchingRoute { path: String },

    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        path: String,
        method: Method,
        allowed: Vec<Method>,
    },

    #[error("no converter can read request body declared as '{content_type}'")]
    UnsupportedMediaType { content_type: String },

    #[error("no acceptable representation; producible: {producible:?}")]
    NotAcceptable { producible: Vec<String> },

    #[error("ambiguous mapping for {path}: '{first}' and '{second}' rank equally")]
    AmbiguousMapping {
        path: String,
        first: String,
        second: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request body could not be decoded: {0}")]
    UnreadableBody(String),

    #[error("missing required {kind} '{name}'")]
    MissingInput { kind: &'static str, name: String },

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("internal dispatch failure: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::NoMatchingRoute { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DispatchError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            DispatchError::UnreadableBody(_) | DispatchError::MissingInput { .. } => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::AmbiguousMapping { .. }
            | DispatchError::Configuration(_)
            | DispatchError::Handler(_)
            | DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::NoMatchingRoute { .. } => "NO_MATCHING_ROUTE",
            DispatchError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            DispatchError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            DispatchError::NotAcceptable { .. } => "NOT_ACCEPTABLE",
            DispatchError::AmbiguousMapping { .. } => "AMBIGUOUS_MAPPING",
            DispatchError::Configuration(_) => "CONFIGURATION_ERROR",
            DispatchError::UnreadableBody(_) => "UNREADABLE_BODY",
            DispatchError::MissingInput { .. } => "MISSING_INPUT",
            DispatchError::Handler(_) => "HANDLER_ERROR",
            DispatchError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Fatal classes signal a registration bug rather than a bad request;
    /// they should abort startup when they can be detected there.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DispatchError::AmbiguousMapping { .. } | DispatchError::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = DispatchError::NoMatchingRoute { path: "/x".into() };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = DispatchError::MethodNotAllowed {
            path: "/x".into(),
            method: Method::DELETE,
            allowed: vec![Method::GET],
        };
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        let err = DispatchError::NotAcceptable { producible: vec![] };
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(DispatchError::Configuration("x".into()).is_fatal());
        assert!(
            DispatchError::AmbiguousMapping {
                path: "/x".into(),
                first: "a".into(),
                second: "b".into(),
            }
            .is_fatal()
        );
        assert!(!DispatchError::NoMatchingRoute { path: "/x".into() }.is_fatal());
    }
}
