use std::sync::Arc;
use std::time::Duration;

use aide::openapi::OpenApi;
use axum::{extract::DefaultBodyLimit, Extension, Router};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::routes;
use crate::{types::Environment, upload::UploadService};

/// Headroom between the upload deadline and the outer request timeout
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Builds the application router with its shared dependencies and limits
///
/// Bodies above `max_upload_bytes` are rejected with 413. `request_timeout` is the
/// upload deadline enforced by [`UploadService`]; the outer timeout layer only fires
/// a little after it, for requests stuck before reaching the handler.
pub fn router(
    environment: Environment,
    upload_service: Arc<UploadService>,
    max_upload_bytes: usize,
    request_timeout: Duration,
) -> Router {
    let mut openapi = OpenApi::default();

    routes::handler(environment)
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(upload_service))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(tower_http::timeout::TimeoutLayer::new(
            request_timeout + REQUEST_TIMEOUT_GRACE,
        ))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if `PORT` is invalid or the server fails to start or bind to the
/// port
pub async fn start(
    environment: Environment,
    upload_service: Arc<UploadService>,
    max_upload_bytes: usize,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let app = router(
        environment,
        upload_service,
        max_upload_bytes,
        request_timeout,
    )
    // Include trace context as header into the response
    .layer(OtelInResponseLayer)
    // Start OpenTelemetry trace on incoming request
    .layer(OtelAxumLayer::default());

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Resume Upload Backend started on http://{addr}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
