mod docs;
pub mod health;
pub mod upload;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};

use crate::types::Environment;

/// Creates the router with all handler routes
pub fn handler(environment: Environment) -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler(environment))
        .api_route("/health", get(health::handler))
        .api_route("/api/upload", post(upload::upload_resume))
}
