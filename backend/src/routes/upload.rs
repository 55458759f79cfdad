use std::sync::Arc;

use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    types::{AppError, ResumeForm},
    upload::UploadService,
};

/// Message returned once the file is stored and the email is sent
pub const UPLOAD_SUCCESS_MESSAGE: &str = "E-mail enviado e arquivo salvo!";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// Human-readable confirmation
    pub message: String,
    /// Public URL of the stored file
    pub url: String,
}

/// Receives a résumé, stores it and notifies the recruiter
///
/// Expects `multipart/form-data` with:
/// - `curriculo`: the file (required)
/// - `nome`, `sobrenome`: candidate name (required)
/// - `emailRecrutador`: notification recipient (optional, a fallback address is used otherwise)
///
/// The file is stored at `public/<file name>`, overwriting any previous upload with the
/// same name, and then sent as an attachment alongside a link to its public URL.
///
/// # Errors
///
/// - 400 when the form is malformed or a required field is missing or blank
/// - 413 when the body exceeds the configured upload limit
/// - 500 when storing the file or sending the email fails, or the upload outlives its deadline
#[instrument(skip(upload_service, form))]
pub async fn upload_resume(
    Extension(upload_service): Extension<Arc<UploadService>>,
    ResumeForm(form): ResumeForm,
) -> Result<Json<UploadResponse>, AppError> {
    let receipt = upload_service.process(form).await?;

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        url: receipt.public_url,
    }))
}
