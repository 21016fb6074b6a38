//! Handler endpoint: the opaque invocable target routing selects.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::BodyValue;
use crate::strategy::{ParameterSpec, ReturnSpec, ReturnValue};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
}

/// The invocable contract. Arguments arrive already materialized by the
/// binding stage, in signature order.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, args: Vec<BodyValue>) -> Result<ReturnValue, HandlerError>;
}

/// Explicit handler signature, resolved once at registration. This is
/// what the strategy composites key their caches on; there is no runtime
/// reflection anywhere in the dispatch path.
#[derive(Debug, Clone, Default)]
pub struct HandlerSignature {
    pub parameters: Vec<ParameterSpec>,
    pub returns: ReturnSpec,
}

impl HandlerSignature {
    pub fn new(parameters: Vec<ParameterSpec>, returns: ReturnSpec) -> Self {
        Self {
            parameters,
            returns,
        }
    }
}

/// One registered target: a stable name (for logs and ambiguity errors),
/// the signature, and the invocable itself.
#[derive(Clone)]
pub struct HandlerEndpoint {
    name: String,
    signature: HandlerSignature,
    target: Arc<dyn Handler>,
}

impl HandlerEndpoint {
    pub fn new(
        name: impl Into<String>,
        signature: HandlerSignature,
        target: Arc<dyn Handler>,
    ) -> Self {
        Self {
            name: name.into(),
            signature,
            target,
        }
    }

    /// Convenience for closure-backed handlers.
    pub fn from_fn<F, Fut>(name: impl Into<String>, signature: HandlerSignature, f: F) -> Self
    where
        F: Fn(Vec<BodyValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ReturnValue, HandlerError>> + Send + 'static,
    {
        Self::new(name, signature, Arc::new(FnHandler(f)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &HandlerSignature {
        &self.signature
    }

    pub async fn invoke(&self, args: Vec<BodyValue>) -> Result<ReturnValue, HandlerError> {
        self.target.invoke(args).await
    }
}

impl fmt::Debug for HandlerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEndpoint")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Vec<BodyValue>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ReturnValue, HandlerError>> + Send,
{
    async fn invoke(&self, args: Vec<BodyValue>) -> Result<ReturnValue, HandlerError> {
        (self.0)(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_fn_handler_invocation() {
        let endpoint = HandlerEndpoint::from_fn(
            "echo",
            HandlerSignature::default(),
            |args: Vec<BodyValue>| async move {
                Ok(ReturnValue::ok(
                    args.into_iter()
                        .next()
                        .unwrap_or(BodyValue::Text(String::new())),
                ))
            },
        );

        let result = endpoint
            .invoke(vec![BodyValue::Text("hello".to_string())])
            .await
            .unwrap();
        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(result.body, Some(BodyValue::Text("hello".to_string())));
    }
}
