//! OpenAPI document and Scalar UI, only mounted outside production

use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{routing::get, Extension, Json};

use crate::types::Environment;

const OPENAPI_PATH: &str = "/openapi.json";

pub fn handler(environment: Environment) -> ApiRouter {
    if !environment.show_api_docs() {
        return ApiRouter::new();
    }

    let scalar = Scalar::new(OPENAPI_PATH).with_title("Resume Upload Backend Docs");

    ApiRouter::new()
        .route("/docs", scalar.axum_route())
        .route(OPENAPI_PATH, get(openapi_schema))
}

#[allow(clippy::unused_async)]
async fn openapi_schema(Extension(openapi): Extension<OpenApi>) -> Json<OpenApi> {
    Json(openapi)
}
