//! Transactional email delivery through the Resend HTTP API
mod error;

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::{Deserialize, Serialize};
use url::Url;

pub use error::{MailerError, MailerResult};

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// File attached to an outgoing email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Bytes,
}

/// A fully composed email, ready to hand to a [`Mailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Provider acknowledgement for an accepted email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Provider-assigned message id
    pub id: String,
}

/// Trait for transactional email providers
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Hands `email` to the provider for delivery
    async fn send(&self, email: &OutgoingEmail) -> MailerResult<SentEmail>;
}

#[derive(Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    /// Base64 of the file bytes
    content: String,
}

#[derive(Deserialize)]
struct ResendEmailResponse {
    id: String,
}

/// HTTP client for the Resend `POST /emails` endpoint
pub struct ResendMailer {
    emails_endpoint: Url,
    api_key: String,
    http_client: ClientWithMiddleware,
}

impl ResendMailer {
    /// Creates a new Resend client
    ///
    /// # Errors
    ///
    /// Returns `MailerError::Client` if `api_url` cannot carry a path or the HTTP
    /// client fails to build
    pub fn new(api_url: &Url, api_key: String) -> MailerResult<Self> {
        let mut emails_endpoint = api_url.clone();
        emails_endpoint
            .path_segments_mut()
            .map_err(|()| MailerError::Client(format!("{api_url} cannot be used as a base URL")))?
            .pop_if_empty()
            .push("emails");

        let reqwest_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .build()
            .map_err(|e| MailerError::Client(e.to_string()))?;

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            emails_endpoint,
            api_key,
            http_client,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> MailerResult<SentEmail> {
        let request = ResendEmailRequest {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|attachment| ResendAttachment {
                    filename: &attachment.filename,
                    content: STANDARD.encode(&attachment.content),
                })
                .collect(),
        };

        let json_body = serde_json::to_string(&request)
            .map_err(|e| MailerError::Client(format!("Failed to serialize email: {e}")))?;

        let response = self
            .http_client
            .post(self.emails_endpoint.clone())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let accepted = response
            .json::<ResendEmailResponse>()
            .await
            .map_err(|e| MailerError::InvalidResponse(e.to_string()))?;

        tracing::debug!(email_id = %accepted.id, "email accepted by provider");

        Ok(SentEmail { id: accepted.id })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    use super::{Mailer, MailerError, MailerResult, OutgoingEmail, SentEmail};

    /// Mailer that records every accepted email instead of delivering it
    #[derive(Default)]
    pub struct MockMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: AtomicBool,
        attempts: AtomicUsize,
    }

    impl MockMailer {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A mailer whose provider rejects every message
        #[must_use]
        pub fn failing() -> Self {
            let mailer = Self::default();
            mailer.fail.store(true, Ordering::SeqCst);
            mailer
        }

        #[must_use]
        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of send calls, failed ones included
        #[must_use]
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: &OutgoingEmail) -> MailerResult<SentEmail> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

            if self.fail.load(Ordering::SeqCst) {
                return Err(MailerError::Rejected {
                    status: 422,
                    body: r#"{"message":"simulated rejection"}"#.to_string(),
                });
            }

            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(email.clone());

            Ok(SentEmail {
                id: format!("mock-email-{attempt}"),
            })
        }
    }
}
