//! Built-in endpoints, registered through the dispatch engine itself.
//!
//! These are the service's own operational surface (health, version,
//! echo, greeting) and double as a live exercise of every dispatch
//! feature: method sets, consumes/produces declarations, path variables,
//! body binding, and response negotiation.

use serde_json::json;

use super::models::HealthResponse;
use crate::codec::{BodyValue, PayloadKind};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::registry::{HandlerEndpoint, HandlerError, HandlerSignature};
use crate::route::Route;
use crate::strategy::{ParameterSpec, ReturnSpec, ReturnValue};
use axum::http::Method;

/// Assembles the dispatcher with the built-in route table. Fatal
/// configuration problems (duplicate routes, uncovered signatures,
/// malformed media declarations) surface here, before serving begins.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher, DispatchError> {
    let fallback = config
        .fallback_media()
        .map_err(|err| DispatchError::Configuration(err.to_string()))?;

    let routes = [
        (health_route()?, health_endpoint()),
        (version_route()?, version_endpoint()),
        (echo_route()?, echo_endpoint()),
        (greet_route()?, greet_endpoint()),
    ];

    let mut builder = Dispatcher::builder().fallback_media(fallback);
    for (route, endpoint) in routes {
        builder = builder.route(route, endpoint);
    }
    builder.build()
}

fn health_route() -> Result<Route, DispatchError> {
    Route::builder()
        .path("/health")
        .method(Method::GET)
        .produces("application/json")
        .build()
        .map_err(|err| DispatchError::Configuration(err.to_string()))
}

fn health_endpoint() -> HandlerEndpoint {
    HandlerEndpoint::from_fn(
        "health",
        HandlerSignature::new(Vec::new(), ReturnSpec::Payload),
        |_args| async {
            let payload = HealthResponse {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                routes: BUILTIN_ROUTE_COUNT,
            };
            let value = serde_json::to_value(payload)
                .map_err(|err| HandlerError::Failed(err.to_string()))?;
            Ok(ReturnValue::ok(BodyValue::Json(value)))
        },
    )
}

fn version_route() -> Result<Route, DispatchError> {
    Route::builder()
        .path("/version")
        .method(Method::GET)
        .produces("text/plain")
        .build()
        .map_err(|err| DispatchError::Configuration(err.to_string()))
}

fn version_endpoint() -> HandlerEndpoint {
    HandlerEndpoint::from_fn(
        "version",
        HandlerSignature::new(Vec::new(), ReturnSpec::Payload),
        |_args| async {
            Ok(ReturnValue::ok(BodyValue::Text(
                env!("CARGO_PKG_VERSION").to_string(),
            )))
        },
    )
}

// Echo declares neither consumes nor produces: the body read and the
// response format are fully negotiated, so an unreadable Content-Type
// surfaces as 415 and an unsatisfiable Accept as 406.
fn echo_route() -> Result<Route, DispatchError> {
    Route::builder()
        .path("/echo")
        .method(Method::POST)
        .build()
        .map_err(|err| DispatchError::Configuration(err.to_string()))
}

fn echo_endpoint() -> HandlerEndpoint {
    HandlerEndpoint::from_fn(
        "echo",
        HandlerSignature::new(
            vec![ParameterSpec::body(PayloadKind::Json)],
            ReturnSpec::Payload,
        ),
        |mut args: Vec<BodyValue>| async move {
            if args.is_empty() {
                return Err(HandlerError::Failed("echo called without a body".into()));
            }
            Ok(ReturnValue::ok(args.remove(0)))
        },
    )
}

fn greet_route() -> Result<Route, DispatchError> {
    Route::builder()
        .path("/greet/{name}")
        .method(Method::GET)
        .produces("application/json")
        .build()
        .map_err(|err| DispatchError::Configuration(err.to_string()))
}

fn greet_endpoint() -> HandlerEndpoint {
    HandlerEndpoint::from_fn(
        "greet",
        HandlerSignature::new(
            vec![ParameterSpec::path_variable("name")],
            ReturnSpec::Payload,
        ),
        |args: Vec<BodyValue>| async move {
            let Some(BodyValue::Text(name)) = args.first() else {
                return Err(HandlerError::Failed("expected text path variable".into()));
            };
            Ok(ReturnValue::ok(BodyValue::Json(json!({
                "greeting": format!("hello, {name}")
            }))))
        },
    )
}

const BUILTIN_ROUTE_COUNT: usize = 4;
