//! Built-in argument resolvers.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ArgumentResolver, BindingContext, BindingSource, ParameterSpec, Strategy};
use crate::codec::BodyValue;
use crate::error::DispatchError;
use crate::negotiation::ContentNegotiator;

/// Binds `{var}` template values extracted from the matched pattern.
#[derive(Debug, Default)]
pub struct PathVariableResolver;

impl Strategy<ParameterSpec> for PathVariableResolver {
    fn supports(&self, signature: &ParameterSpec) -> bool {
        signature.source == BindingSource::PathVariable
    }
}

#[async_trait]
impl ArgumentResolver for PathVariableResolver {
    fn name(&self) -> &'static str {
        "path-variable"
    }

    async fn resolve(
        &self,
        spec: &ParameterSpec,
        ctx: &mut BindingContext<'_>,
    ) -> Result<BodyValue, DispatchError> {
        match ctx.path_vars.get(&spec.name) {
            Some(value) => Ok(BodyValue::Text(value.clone())),
            // The pattern matched but carries no such template name; that
            // is a signature/pattern mismatch, not client error.
            None => Err(DispatchError::Internal(format!(
                "path variable '{}' not present in matched pattern",
                spec.name
            ))),
        }
    }
}

/// Binds query-string parameters.
#[derive(Debug, Default)]
pub struct QueryParamResolver;

impl Strategy<ParameterSpec> for QueryParamResolver {
    fn supports(&self, signature: &ParameterSpec) -> bool {
        signature.source == BindingSource::QueryParam
    }
}

#[async_trait]
impl ArgumentResolver for QueryParamResolver {
    fn name(&self) -> &'static str {
        "query-param"
    }

    async fn resolve(
        &self,
        spec: &ParameterSpec,
        ctx: &mut BindingContext<'_>,
    ) -> Result<BodyValue, DispatchError> {
        match ctx.request.query_value(&spec.name) {
            Some(value) => Ok(BodyValue::Text(value.to_string())),
            None if spec.required => Err(DispatchError::MissingInput {
                kind: "query parameter",
                name: spec.name.clone(),
            }),
            None => Ok(BodyValue::Text(String::new())),
        }
    }
}

/// Binds header values.
#[derive(Debug, Default)]
pub struct HeaderResolver;

impl Strategy<ParameterSpec> for HeaderResolver {
    fn supports(&self, signature: &ParameterSpec) -> bool {
        signature.source == BindingSource::Header
    }
}

#[async_trait]
impl ArgumentResolver for HeaderResolver {
    fn name(&self) -> &'static str {
        "header"
    }

    async fn resolve(
        &self,
        spec: &ParameterSpec,
        ctx: &mut BindingContext<'_>,
    ) -> Result<BodyValue, DispatchError> {
        match ctx.request.header_value(&spec.name) {
            Some(value) => Ok(BodyValue::Text(value.to_string())),
            None if spec.required => Err(DispatchError::MissingInput {
                kind: "header",
                name: spec.name.clone(),
            }),
            None => Ok(BodyValue::Text(String::new())),
        }
    }
}

/// Reads the request body through the codec list, honoring the declared
/// Content-Type. Consumes the one-shot body stream.
pub struct BodyResolver {
    negotiator: Arc<ContentNegotiator>,
}

impl BodyResolver {
    pub fn new(negotiator: Arc<ContentNegotiator>) -> Self {
        Self { negotiator }
    }
}

impl Strategy<ParameterSpec> for BodyResolver {
    fn supports(&self, signature: &ParameterSpec) -> bool {
        matches!(signature.source, BindingSource::Body(_))
    }
}

#[async_trait]
impl ArgumentResolver for BodyResolver {
    fn name(&self) -> &'static str {
        "request-body"
    }

    async fn resolve(
        &self,
        spec: &ParameterSpec,
        ctx: &mut BindingContext<'_>,
    ) -> Result<BodyValue, DispatchError> {
        let BindingSource::Body(target) = spec.source else {
            return Err(DispatchError::Internal(
                "body resolver asked to bind a non-body parameter".to_string(),
            ));
        };
        let body = ctx.take_body()?;
        self.negotiator.read_body(target, ctx.request, body).await
    }
}
