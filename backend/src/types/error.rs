//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
    object_storage::BucketError,
    upload::{FileProblem, InvalidField, UploadError},
};

/// Message returned for every failure past validation
pub const PROCESSING_FAILED_MESSAGE: &str = "Erro ao processar envio.";

/// API error response envelope
///
/// `error` keeps the flat, human-readable message existing clients display;
/// `code` tells the failure kinds apart.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: &'static str,
    /// Machine-readable error code
    pub code: &'static str,
    /// Whether the client should retry the request
    pub allow_retry: bool,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
    /// Internal cause, logged but never returned
    detail: Option<String>,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                error: msg,
                code,
                allow_retry: retry,
            },
            detail: None,
        }
    }

    /// Attach the internal cause for the log line
    #[must_use]
    pub fn with_detail(mut self, detail: impl std::fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// 400 for a form that failed validation
    #[must_use]
    pub const fn bad_request(code: &'static str, msg: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg, false)
    }

    /// 500 with the generic processing failure message
    #[must_use]
    pub const fn processing_failed(code: &'static str, retry: bool) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            PROCESSING_FAILED_MESSAGE,
            retry,
        )
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        let detail = self.detail.as_deref().unwrap_or(self.inner.error);
        match self.status.as_u16() {
            400..=499 => tracing::warn!(code = self.inner.code, error = detail, "client error"),
            500..=599 => tracing::error!(code = self.inner.code, error = detail, "server error"),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

impl From<InvalidField> for AppError {
    fn from(field: InvalidField) -> Self {
        match field {
            InvalidField::File(FileProblem::Empty) => {
                Self::bad_request("empty_file", "O arquivo enviado está vazio.")
            }
            InvalidField::File(FileProblem::InvalidName) => {
                Self::bad_request("invalid_file_name", "Nome de arquivo inválido.")
            }
            InvalidField::FirstName => {
                Self::bad_request("invalid_first_name", "O campo 'nome' é obrigatório.")
            }
            InvalidField::LastName => {
                Self::bad_request("invalid_last_name", "O campo 'sobrenome' é obrigatório.")
            }
            InvalidField::RecipientEmail => Self::bad_request(
                "invalid_recipient_email",
                "O campo 'emailRecrutador' deve ser um e-mail válido.",
            ),
        }
    }
}

/// Convert upload failures to application errors
///
/// Every failure past validation shares the same client-facing message; the
/// underlying cause only reaches the logs.
impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(field) => field.into(),
            UploadError::Storage(err) => {
                let retry = matches!(
                    err,
                    BucketError::UpstreamError(_) | BucketError::AwsError(_)
                );
                Self::processing_failed("storage_error", retry).with_detail(err)
            }
            UploadError::Email(err) => {
                Self::processing_failed("email_error", err.is_transient()).with_detail(err)
            }
            UploadError::Template(err) => {
                Self::processing_failed("template_error", false).with_detail(err)
            }
            err @ UploadError::Timeout(_) => {
                Self::processing_failed("timeout", true).with_detail(err)
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
