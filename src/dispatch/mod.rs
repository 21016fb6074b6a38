//! The assembled dispatch flow.
//!
//! One [`Dispatcher`] owns the route registry, the two strategy
//! composites, and the negotiation engine, and runs a request end to end:
//! resolve -> bind arguments -> invoke handler -> complete return value.
//!
//! ## Flow:
//! 1. Registry resolves the request to one endpoint (or a structured
//!    failure: 404/405/ambiguous)
//! 2. Path variables are extracted from the best-matching pattern
//! 3. Each parameter of the endpoint signature is bound by the first
//!    capable argument resolver (body parameters read through the codec
//!    list, honoring Content-Type: 415 material)
//! 4. The handler runs
//! 5. The return-value handler completes the response, negotiating the
//!    response media type against Accept and the narrowed produces set
//!    (406 material)

use std::sync::Arc;

use axum::body::Body;
use tracing::debug;

use crate::codec::{BodyConverter, default_converters};
use crate::error::DispatchError;
use crate::media::MediaRange;
use crate::negotiation::ContentNegotiator;
use crate::registry::{HandlerEndpoint, MappingRegistry, RouteMatch};
use crate::request::RouteRequest;
use crate::route::Route;
use crate::strategy::{
    ArgumentResolver, ArgumentResolvers, BindingContext, BodyResolver, HeaderResolver,
    PathVariableResolver, QueryParamResolver, ResponseBodyHandler, ResponseParts,
    ReturnValueHandler, ReturnValueHandlers, StatusOnlyHandler, StrategyComposite,
};

pub struct Dispatcher {
    registry: Arc<MappingRegistry>,
    argument_resolvers: ArgumentResolvers,
    return_handlers: ReturnValueHandlers,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Routing only: resolve without binding or invoking. Useful for
    /// callers that drive the binding stage themselves.
    pub fn resolve(&self, request: &RouteRequest) -> Result<RouteMatch, DispatchError> {
        self.registry.resolve(request)
    }

    pub async fn dispatch(
        &self,
        request: &RouteRequest,
        body: Body,
    ) -> Result<ResponseParts, DispatchError> {
        let matched = self.registry.resolve(request)?;
        debug!(
            path = request.path(),
            endpoint = matched.endpoint.name(),
            "dispatching"
        );

        let path_vars = matched
            .route
            .patterns()
            .first()
            .map(|pattern| {
                matched
                    .route
                    .path_matcher()
                    .extract(pattern, request.path())
            })
            .unwrap_or_default();

        let signature = matched.endpoint.signature();
        let mut ctx = BindingContext::new(request, path_vars, body);
        let mut args = Vec::with_capacity(signature.parameters.len());
        for spec in &signature.parameters {
            let resolver = self.argument_resolvers.resolve(spec)?;
            args.push(resolver.resolve(spec, &mut ctx).await?);
        }

        let value = matched
            .endpoint
            .invoke(args)
            .await
            .map_err(|err| DispatchError::Handler(err.to_string()))?;

        let handler = self.return_handlers.resolve(&signature.returns)?;
        handler
            .handle(&signature.returns, value, request, matched.route.produces())
            .await
    }
}

/// Builds a [`Dispatcher`]: routes, codecs, and strategies are collected
/// and validated in one place so configuration problems fail startup
/// instead of the first live request.
#[derive(Default)]
pub struct DispatcherBuilder {
    routes: Vec<(Route, HandlerEndpoint)>,
    converters: Option<Vec<Arc<dyn BodyConverter>>>,
    fallback_media: Option<MediaRange>,
    argument_resolvers: Vec<Arc<dyn ArgumentResolver>>,
    return_handlers: Vec<Arc<dyn ReturnValueHandler>>,
}

impl DispatcherBuilder {
    pub fn route(mut self, route: Route, endpoint: HandlerEndpoint) -> Self {
        self.routes.push((route, endpoint));
        self
    }

    /// Replaces the default codec list. Order is selection order.
    pub fn converters(mut self, converters: Vec<Arc<dyn BodyConverter>>) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Concrete media type substituted when negotiation ends on a bare
    /// wildcard; defaults to `application/octet-stream`.
    pub fn fallback_media(mut self, fallback: MediaRange) -> Self {
        self.fallback_media = Some(fallback);
        self
    }

    /// Prepends a custom argument resolver; custom strategies are tested
    /// before the built-in ones.
    pub fn argument_resolver(mut self, resolver: Arc<dyn ArgumentResolver>) -> Self {
        self.argument_resolvers.push(resolver);
        self
    }

    /// Prepends a custom return-value handler.
    pub fn return_handler(mut self, handler: Arc<dyn ReturnValueHandler>) -> Self {
        self.return_handlers.push(handler);
        self
    }

    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        let mut negotiator =
            ContentNegotiator::new(self.converters.unwrap_or_else(default_converters));
        if let Some(fallback) = self.fallback_media {
            negotiator = negotiator.with_fallback(fallback);
        }
        let negotiator = Arc::new(negotiator);

        let mut resolvers = self.argument_resolvers;
        resolvers.push(Arc::new(PathVariableResolver));
        resolvers.push(Arc::new(QueryParamResolver));
        resolvers.push(Arc::new(HeaderResolver));
        resolvers.push(Arc::new(BodyResolver::new(Arc::clone(&negotiator))));
        let argument_resolvers = StrategyComposite::new("argument resolver", resolvers);

        let mut handlers = self.return_handlers;
        handlers.push(Arc::new(ResponseBodyHandler::new(Arc::clone(&negotiator))));
        handlers.push(Arc::new(StatusOnlyHandler));
        let return_handlers = StrategyComposite::new("return value handler", handlers);

        let mut registry = MappingRegistry::new();
        for (route, endpoint) in self.routes {
            // Strategy coverage is checked before the endpoint is live
            argument_resolvers.verify_coverage(endpoint.signature().parameters.iter())?;
            return_handlers.verify_coverage([&endpoint.signature().returns])?;
            registry
                .register(route, endpoint)
                .map_err(|err| DispatchError::Configuration(err.to_string()))?;
        }

        Ok(Dispatcher {
            registry: Arc::new(registry),
            argument_resolvers,
            return_handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BodyValue, PayloadKind};
    use crate::registry::HandlerSignature;
    use crate::strategy::{ParameterSpec, ReturnSpec, ReturnValue};
    use axum::http::{Method, StatusCode};

    fn dispatcher() -> Dispatcher {
        let greet = HandlerEndpoint::from_fn(
            "greet",
            HandlerSignature::new(
                vec![ParameterSpec::path_variable("name")],
                ReturnSpec::Payload,
            ),
            |args: Vec<BodyValue>| async move {
                let BodyValue::Text(name) = &args[0] else {
                    unreachable!("path variables bind as text");
                };
                Ok(ReturnValue::ok(BodyValue::Json(
                    serde_json::json!({ "greeting": format!("hello {name}") }),
                )))
            },
        );

        let echo = HandlerEndpoint::from_fn(
            "echo",
            HandlerSignature::new(
                vec![ParameterSpec::body(PayloadKind::Json)],
                ReturnSpec::Payload,
            ),
            |mut args: Vec<BodyValue>| async move {
                Ok(ReturnValue::ok(args.remove(0)))
            },
        );

        Dispatcher::builder()
            .route(
                Route::builder()
                    .path("/greet/{name}")
                    .method(Method::GET)
                    .produces("application/json")
                    .build()
                    .unwrap(),
                greet,
            )
            .route(
                Route::builder()
                    .path("/echo")
                    .method(Method::POST)
                    .consumes("application/json")
                    .produces("application/json")
                    .build()
                    .unwrap(),
                echo,
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_binds_path_variable() {
        let dispatcher = dispatcher();
        let request = RouteRequest::new(Method::GET, "/greet/world");

        let parts = dispatcher.dispatch(&request, Body::empty()).await.unwrap();
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(parts.media_type.unwrap().essence(), "application/json");

        let json: serde_json::Value = serde_json::from_slice(&parts.body).unwrap();
        assert_eq!(json["greeting"], "hello world");
    }

    #[tokio::test]
    async fn test_dispatch_reads_body_through_codecs() {
        let dispatcher = dispatcher();
        let request = RouteRequest::new(Method::POST, "/echo")
            .with_header("content-type", "application/json");

        let parts = dispatcher
            .dispatch(&request, Body::from(r#"{"k":"v"}"#))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&parts.body).unwrap();
        assert_eq!(json["k"], "v");
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_unreadable_body() {
        let dispatcher = dispatcher();
        let request = RouteRequest::new(Method::POST, "/echo")
            .with_header("content-type", "application/json");
        // Route matched (consumes json), but the body resolver still runs
        // through the codec list; a declared-but-wrong body fails there
        let err = dispatcher
            .dispatch(&request, Body::from("{broken"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnreadableBody(_)));
    }

    #[tokio::test]
    async fn test_dispatch_not_found_and_method_not_allowed() {
        let dispatcher = dispatcher();

        let err = dispatcher
            .dispatch(&RouteRequest::new(Method::GET, "/missing"), Body::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoMatchingRoute { .. }));

        let err = dispatcher
            .dispatch(&RouteRequest::new(Method::DELETE, "/echo"), Body::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotAllowed { .. }));
    }
}
