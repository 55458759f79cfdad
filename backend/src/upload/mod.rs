//! Résumé upload workflow
//!
//! Validates the submitted form, stores the file, resolves its public URL and emails
//! a notification carrying both the link and the file. Steps run strictly in that
//! order and stop at the first failure. Nothing is rolled back: a file stored before
//! a failed email stays stored.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use bytes::Bytes;
use thiserror::Error;
use tracing::instrument;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    mailer::{Attachment, Mailer, MailerError, OutgoingEmail},
    object_storage::{object_key_for, BucketError, ObjectStore},
};

/// Deadline for storing and notifying, above the storage and email client timeouts
pub const DEFAULT_PROCESSING_DEADLINE: Duration = Duration::from_secs(75);

/// File part of the upload form
#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub name: String,
    /// Client-declared MIME type, informational only
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One upload submission, alive for a single request
#[derive(Debug, Clone, Validate)]
pub struct ResumeUpload {
    #[validate(custom(function = "validate_file"))]
    pub file: UploadedFile,
    #[validate(custom(function = "validate_not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub last_name: String,
    #[validate(email)]
    pub recipient_email: Option<String>,
}

/// What was wrong with the submitted file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileProblem {
    Empty,
    InvalidName,
}

/// First invalid field of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidField {
    File(FileProblem),
    FirstName,
    LastName,
    RecipientEmail,
}

impl InvalidField {
    /// Picks the most relevant failure, file problems first
    fn from_errors(errors: &ValidationErrors) -> Self {
        let mut found: Vec<Self> = errors
            .field_errors()
            .into_iter()
            .map(|(field, field_errors)| {
                let field: &str = field.as_ref();
                match field {
                    "file" => {
                        let empty = field_errors.iter().any(|error| error.code == "empty_file");
                        Self::File(if empty {
                            FileProblem::Empty
                        } else {
                            FileProblem::InvalidName
                        })
                    }
                    "first_name" => Self::FirstName,
                    "last_name" => Self::LastName,
                    _ => Self::RecipientEmail,
                }
            })
            .collect();

        found.sort_by_key(|field| match field {
            Self::File(_) => 0,
            Self::FirstName => 1,
            Self::LastName => 2,
            Self::RecipientEmail => 3,
        });
        found.first().copied().unwrap_or(Self::RecipientEmail)
    }
}

/// Why an upload did not complete
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("invalid submission: {0:?}")]
    Validation(InvalidField),

    #[error("storage failed: {0}")]
    Storage(#[from] BucketError),

    #[error("email dispatch failed: {0}")]
    Email(#[from] MailerError),

    #[error("email rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("upload did not finish within {0:?}")]
    Timeout(Duration),
}

impl From<ValidationErrors> for UploadError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(InvalidField::from_errors(&errors))
    }
}

/// Addresses used for notification emails
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub from: String,
    /// Recipient when the form does not name one
    pub fallback_recipient: String,
}

/// Outcome of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub object_key: String,
    pub public_url: String,
    pub email_id: String,
}

/// Body of the notification email; interpolated values are HTML-escaped
#[derive(Template)]
#[template(path = "resume_notification.html")]
struct ResumeNotificationTemplate<'a> {
    first_name: &'a str,
    last_name: &'a str,
    public_url: &'a str,
}

/// Runs the store-then-notify workflow
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    mailer: Arc<dyn Mailer>,
    settings: NotificationSettings,
    deadline: Duration,
}

impl UploadService {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
            deadline: DEFAULT_PROCESSING_DEADLINE,
        }
    }

    /// Caps how long storing and notifying may take together
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Stores the file and sends the notification email
    ///
    /// # Errors
    ///
    /// - `UploadError::Validation` before any external call when the submission is invalid
    /// - `UploadError::Storage` when the write or the public URL lookup fails; no email is sent
    /// - `UploadError::Email` when the provider refuses the message; the stored file is kept
    /// - `UploadError::Template` when the email body cannot be rendered
    /// - `UploadError::Timeout` when the steps after validation outlive the deadline
    #[instrument(skip_all, fields(file_name = %upload.file.name, size = upload.file.bytes.len()))]
    pub async fn process(&self, upload: ResumeUpload) -> Result<UploadReceipt, UploadError> {
        upload.validate()?;

        tokio::time::timeout(self.deadline, self.store_and_notify(&upload))
            .await
            .map_err(|_| UploadError::Timeout(self.deadline))?
    }

    async fn store_and_notify(&self, upload: &ResumeUpload) -> Result<UploadReceipt, UploadError> {
        let object_key = object_key_for(&upload.file.name);
        // Stored as PDF whatever the client declared
        self.store
            .put_object(
                &object_key,
                upload.file.bytes.clone(),
                mime::APPLICATION_PDF.as_ref(),
            )
            .await?;

        let public_url = self.store.public_url(&object_key)?;
        tracing::info!(%object_key, %public_url, "résumé stored");

        let email = self.compose_email(upload, &public_url)?;
        let sent = self.mailer.send(&email).await?;
        tracing::info!(email_id = %sent.id, to = %email.to, "notification sent");

        Ok(UploadReceipt {
            object_key,
            public_url,
            email_id: sent.id,
        })
    }

    /// Builds the notification for `upload`, attaching the in-memory file
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Template` if the body fails to render
    pub fn compose_email(
        &self,
        upload: &ResumeUpload,
        public_url: &str,
    ) -> Result<OutgoingEmail, UploadError> {
        let to = upload
            .recipient_email
            .clone()
            .unwrap_or_else(|| self.settings.fallback_recipient.clone());

        let html = ResumeNotificationTemplate {
            first_name: &upload.first_name,
            last_name: &upload.last_name,
            public_url,
        }
        .render()?;

        Ok(OutgoingEmail {
            from: self.settings.from.clone(),
            to,
            subject: format!("Novo Currículo: {}", upload.file.name),
            html,
            attachments: vec![Attachment {
                filename: upload.file.name.clone(),
                content: upload.file.bytes.clone(),
            }],
        })
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_file(file: &UploadedFile) -> Result<(), ValidationError> {
    let name = file.name.as_str();
    if name.trim().is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ValidationError::new("invalid_file_name"));
    }
    if file.bytes.is_empty() {
        return Err(ValidationError::new("empty_file"));
    }
    Ok(())
}
