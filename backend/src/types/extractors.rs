//! Custom extractors for request parsing

use aide::operation::OperationInput;
use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::StatusCode,
};

use crate::{
    types::error::AppError,
    upload::{ResumeUpload, UploadedFile},
};

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "curriculo";
/// Multipart field carrying the candidate's first name
pub const FIRST_NAME_FIELD: &str = "nome";
/// Multipart field carrying the candidate's last name
pub const LAST_NAME_FIELD: &str = "sobrenome";
/// Optional multipart field naming the notification recipient
pub const RECIPIENT_FIELD: &str = "emailRecrutador";

/// Extracts a [`ResumeUpload`] from a `multipart/form-data` body
///
/// The file is buffered in memory. Unknown fields are skipped, missing text fields
/// become empty strings (and fail validation later) and a blank recipient counts as
/// absent.
pub struct ResumeForm(pub ResumeUpload);

fn multipart_error(err: &MultipartError) -> AppError {
    tracing::warn!("Multipart read error: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "O arquivo enviado é grande demais.",
            false,
        )
    } else {
        AppError::bad_request("invalid_multipart", "Formulário multipart inválido.")
    }
}

impl<S> FromRequest<S> for ResumeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|err| {
            tracing::warn!("Multipart rejection: {err}");
            AppError::bad_request(
                "invalid_content_type",
                "Envie o formulário como multipart/form-data.",
            )
        })?;

        let mut file = None;
        let mut first_name = None;
        let mut last_name = None;
        let mut recipient_email = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| multipart_error(&err))?
        {
            let Some(field_name) = field.name().map(ToOwned::to_owned) else {
                continue;
            };

            match field_name.as_str() {
                FILE_FIELD => {
                    let name = field.file_name().map(ToOwned::to_owned).unwrap_or_default();
                    let content_type = field.content_type().map(ToOwned::to_owned);
                    let bytes = field.bytes().await.map_err(|err| multipart_error(&err))?;
                    file = Some(UploadedFile {
                        name,
                        content_type,
                        bytes,
                    });
                }
                FIRST_NAME_FIELD => {
                    first_name = Some(field.text().await.map_err(|err| multipart_error(&err))?);
                }
                LAST_NAME_FIELD => {
                    last_name = Some(field.text().await.map_err(|err| multipart_error(&err))?);
                }
                RECIPIENT_FIELD => {
                    recipient_email =
                        Some(field.text().await.map_err(|err| multipart_error(&err))?);
                }
                _ => {}
            }
        }

        let file = file.ok_or_else(|| {
            AppError::bad_request("missing_file", "O arquivo 'curriculo' é obrigatório.")
        })?;

        Ok(Self(ResumeUpload {
            file,
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            recipient_email: recipient_email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
        }))
    }
}

impl OperationInput for ResumeForm {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        // Same body shape as a raw multipart extractor
        Multipart::operation_input(ctx, operation);
    }
}
