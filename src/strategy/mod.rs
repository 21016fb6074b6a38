//! Strategy composites for argument binding and return-value handling.
//!
//! ## Key Components
//!
//! - [`ParameterSpec`] / [`ReturnSpec`] - explicit handler signatures,
//!   resolved once at registration (no runtime reflection)
//! - [`ArgumentResolver`] / [`ReturnValueHandler`] - the two strategy
//!   families, capability-tested via [`Strategy::supports`]
//! - [`StrategyComposite`] - ordered strategy list with a lazily filled
//!   signature cache; first capable strategy wins and is cached
//! - Built-in strategies covering path variables, query params, headers,
//!   negotiated request bodies, and negotiated response bodies

mod composite;
mod handlers;
mod resolvers;

pub use composite::StrategyComposite;
pub use handlers::{ResponseBodyHandler, StatusOnlyHandler};
pub use resolvers::{
    BodyResolver, HeaderResolver, PathVariableResolver, QueryParamResolver,
};

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use bytes::Bytes;

use crate::codec::{BodyValue, PayloadKind};
use crate::error::DispatchError;
use crate::media::MediaRange;
use crate::request::RouteRequest;

/// Where one handler parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    PathVariable,
    QueryParam,
    Header,
    Body(PayloadKind),
}

/// One parameter of a handler signature. Used both to drive binding and
/// as the strategy-cache key, so it stays small and hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterSpec {
    pub name: String,
    pub source: BindingSource,
    pub required: bool,
}

impl ParameterSpec {
    pub fn path_variable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: BindingSource::PathVariable,
            required: true,
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: BindingSource::QueryParam,
            required: true,
        }
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: BindingSource::Header,
            required: true,
        }
    }

    pub fn body(kind: PayloadKind) -> Self {
        Self {
            name: "body".to_string(),
            source: BindingSource::Body(kind),
            required: true,
        }
    }

    /// Missing optional inputs bind as an empty text value instead of
    /// failing the request.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// What a handler returns and how it should be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnSpec {
    /// A value to serialize through content negotiation.
    #[default]
    Payload,
    /// Status only, never a body.
    Status,
}

/// A handler's result before response completion.
#[derive(Debug, Clone)]
pub struct ReturnValue {
    pub status: StatusCode,
    pub body: Option<BodyValue>,
}

impl ReturnValue {
    pub fn ok(body: BodyValue) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(body),
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

/// Completed response pieces handed back to the serving edge.
#[derive(Debug)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub media_type: Option<MediaRange>,
    pub body: Bytes,
}

/// Mutable per-request state available to argument resolvers. The body is
/// taken at most once; a signature declaring two body parameters is a
/// configuration bug surfaced at bind time.
pub struct BindingContext<'a> {
    pub request: &'a RouteRequest,
    pub path_vars: BTreeMap<String, String>,
    body: Option<Body>,
}

impl<'a> BindingContext<'a> {
    pub fn new(
        request: &'a RouteRequest,
        path_vars: BTreeMap<String, String>,
        body: Body,
    ) -> Self {
        Self {
            request,
            path_vars,
            body: Some(body),
        }
    }

    pub fn take_body(&mut self) -> Result<Body, DispatchError> {
        self.body.take().ok_or_else(|| {
            DispatchError::Configuration(
                "request body was already consumed by an earlier parameter".to_string(),
            )
        })
    }
}

/// Capability test shared by both strategy families.
pub trait Strategy<Sig>: Send + Sync {
    fn supports(&self, signature: &Sig) -> bool;
}

/// Materializes one handler argument from the request.
#[async_trait]
pub trait ArgumentResolver: Strategy<ParameterSpec> {
    fn name(&self) -> &'static str;

    async fn resolve(
        &self,
        spec: &ParameterSpec,
        ctx: &mut BindingContext<'_>,
    ) -> Result<BodyValue, DispatchError>;
}

/// Completes a handler's return value into response parts.
#[async_trait]
pub trait ReturnValueHandler: Strategy<ReturnSpec> {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        spec: &ReturnSpec,
        value: ReturnValue,
        request: &RouteRequest,
        producible: &[MediaRange],
    ) -> Result<ResponseParts, DispatchError>;
}

/// The argument-resolver composite type used by the dispatcher.
pub type ArgumentResolvers = StrategyComposite<ParameterSpec, dyn ArgumentResolver>;

/// The return-value-handler composite type used by the dispatcher.
pub type ReturnValueHandlers = StrategyComposite<ReturnSpec, dyn ReturnValueHandler>;
