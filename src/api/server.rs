use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::state::AppState;
use crate::config::Config;
use crate::error::DispatchError;
use crate::request::RouteRequest;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: SocketAddr) -> Result<(), AnyError> {
    // Load config
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    // Build the dispatcher; ambiguity and coverage problems abort here
    let dispatcher = super::endpoints::build_dispatcher(&config)
        .map_err(|e| format!("Failed to build dispatcher: {}", e))?;
    info!(routes = dispatcher.registry().len(), "Dispatcher ready");

    let state = AppState::new(config, dispatcher);
    let app = build_app(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "routebox listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Builds the axum app: a fallback service funnels every request through
/// the dispatch engine, so axum's own router never routes anything.
pub fn build_app(state: AppState) -> Router {
    let max_body_bytes = state.config.server.max_body_bytes;
    Router::new()
        .fallback(dispatch_any)
        .with_state(state)
        // Automatically decompress gzip/deflate/brotli request bodies
        // before size limiting and codec reads see them
        .layer(RequestDecompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

async fn dispatch_any(
    State(state): State<AppState>,
    request: Request,
) -> axum::response::Response {
    let request_id = Uuid::new_v4();
    let (parts, body) = request.into_parts();
    let route_request = RouteRequest::from_parts(&parts);

    debug!(
        %request_id,
        method = %route_request.method(),
        path = route_request.path(),
        "dispatching request"
    );

    match state.dispatcher.dispatch(&route_request, body).await {
        Ok(response) => {
            state.metrics.dispatched();
            let mut builder = axum::http::Response::builder().status(response.status);
            if let Some(media) = &response.media_type {
                builder = builder.header(header::CONTENT_TYPE, media.essence());
            }
            match builder.body(Body::from(response.body)) {
                Ok(response) => response,
                Err(err) => {
                    error!(%request_id, error = %err, "failed to assemble response");
                    DispatchError::Internal(err.to_string()).into_response()
                }
            }
        }
        Err(err) => {
            state.metrics.failed(&err);
            if err.is_fatal() {
                // Registration bugs surfacing at request time: loud
                error!(%request_id, error = %err, "fatal dispatch failure");
            } else {
                debug!(%request_id, error = %err, "request-scoped dispatch failure");
            }
            err.into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
