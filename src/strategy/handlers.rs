//! Built-in return-value handlers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::{ResponseParts, ReturnSpec, ReturnValue, ReturnValueHandler, Strategy};
use crate::error::DispatchError;
use crate::media::MediaRange;
use crate::negotiation::ContentNegotiator;
use crate::request::RouteRequest;

/// Serializes payload returns through the negotiation engine, using the
/// matched route's narrowed producible set.
pub struct ResponseBodyHandler {
    negotiator: Arc<ContentNegotiator>,
}

impl ResponseBodyHandler {
    pub fn new(negotiator: Arc<ContentNegotiator>) -> Self {
        Self { negotiator }
    }
}

impl Strategy<ReturnSpec> for ResponseBodyHandler {
    fn supports(&self, signature: &ReturnSpec) -> bool {
        *signature == ReturnSpec::Payload
    }
}

#[async_trait]
impl ReturnValueHandler for ResponseBodyHandler {
    fn name(&self) -> &'static str {
        "response-body"
    }

    async fn handle(
        &self,
        _spec: &ReturnSpec,
        value: ReturnValue,
        request: &RouteRequest,
        producible: &[MediaRange],
    ) -> Result<ResponseParts, DispatchError> {
        let Some(body) = value.body else {
            // Payload endpoint returned nothing; honor the status alone
            return Ok(ResponseParts {
                status: value.status,
                media_type: None,
                body: Bytes::new(),
            });
        };

        let (media_type, bytes) = self
            .negotiator
            .write_body(&body, producible, request)
            .await?;

        Ok(ResponseParts {
            status: value.status,
            media_type: Some(media_type),
            body: bytes,
        })
    }
}

/// Completes status-only returns; never writes a body.
#[derive(Debug, Default)]
pub struct StatusOnlyHandler;

impl Strategy<ReturnSpec> for StatusOnlyHandler {
    fn supports(&self, signature: &ReturnSpec) -> bool {
        *signature == ReturnSpec::Status
    }
}

#[async_trait]
impl ReturnValueHandler for StatusOnlyHandler {
    fn name(&self) -> &'static str {
        "status-only"
    }

    async fn handle(
        &self,
        _spec: &ReturnSpec,
        value: ReturnValue,
        _request: &RouteRequest,
        _producible: &[MediaRange],
    ) -> Result<ResponseParts, DispatchError> {
        Ok(ResponseParts {
            status: value.status,
            media_type: None,
            body: Bytes::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BodyValue, default_converters};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_response_body_handler_negotiates() {
        let negotiator = Arc::new(ContentNegotiator::new(default_converters()));
        let handler = ResponseBodyHandler::new(negotiator);
        let request = RouteRequest::new(Method::GET, "/jobs")
            .with_header("accept", "application/json");

        let value = ReturnValue::ok(BodyValue::Json(serde_json::json!({"id": 7})));
        let parts = handler
            .handle(&ReturnSpec::Payload, value, &request, &[])
            .await
            .unwrap();

        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(parts.media_type.unwrap().essence(), "application/json");
        assert_eq!(parts.body.as_ref(), br#"{"id":7}"#);
    }

    #[tokio::test]
    async fn test_status_only_handler() {
        let handler = StatusOnlyHandler;
        let request = RouteRequest::new(Method::DELETE, "/jobs/7");

        let parts = handler
            .handle(
                &ReturnSpec::Status,
                ReturnValue::status(StatusCode::NO_CONTENT),
                &request,
                &[],
            )
            .await
            .unwrap();

        assert_eq!(parts.status, StatusCode::NO_CONTENT);
        assert!(parts.media_type.is_none());
        assert!(parts.body.is_empty());
    }
}
