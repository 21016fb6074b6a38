//! The dispatch input contract: everything route matching is allowed to
//! look at. Body bytes stay outside; they are only touched by codecs after
//! a route has been selected.

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, request::Parts};

use crate::media::{self, MediaRange};

/// An immutable view of one incoming request, used for matching and
/// negotiation. Constructed from axum request parts at the serving edge,
/// or directly in tests.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
}

impl RouteRequest {
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (path_and_query, Vec::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        let mut request = Self::new(
            parts.method.clone(),
            parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| parts.uri.path()),
        );
        request.headers = parts.headers.clone();
        request
    }

    /// Test/builder convenience: attach a header value.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The lookup path used for route matching.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(n, _)| n == name)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Accepted media ranges from the Accept header. An absent or empty
    /// header means "anything" (`*/*` with full quality).
    pub fn accepted_media(&self) -> Vec<MediaRange> {
        let ranges = self
            .headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(media::parse_header_value)
            .unwrap_or_default();
        if ranges.is_empty() {
            vec![MediaRange::all()]
        } else {
            ranges
        }
    }

    /// The declared request Content-Type, if present and well-formed.
    pub fn content_type(&self) -> Option<MediaRange> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| MediaRange::parse(v).ok())
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_query_split() {
        let req = RouteRequest::new(Method::GET, "/jobs?state=running&verbose");
        assert_eq!(req.path(), "/jobs");
        assert_eq!(req.query_value("state"), Some("running"));
        assert!(req.has_query("verbose"));
        assert!(!req.has_query("missing"));
    }

    #[test]
    fn test_query_decoding() {
        let req = RouteRequest::new(Method::GET, "/search?q=a%20b");
        assert_eq!(req.query_value("q"), Some("a b"));
    }

    #[test]
    fn test_accept_defaults_to_wildcard() {
        let req = RouteRequest::new(Method::GET, "/jobs");
        let accepted = req.accepted_media();
        assert_eq!(accepted.len(), 1);
        assert!(!accepted[0].is_concrete());
    }

    #[test]
    fn test_content_type_parsing() {
        let req = RouteRequest::new(Method::POST, "/jobs")
            .with_header("content-type", "application/json; charset=utf-8");
        assert_eq!(req.content_type().unwrap().essence(), "application/json");

        let req = RouteRequest::new(Method::POST, "/jobs");
        assert!(req.content_type().is_none());
    }
}
