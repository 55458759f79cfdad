//! Environment configuration for different deployment stages

use std::env;
use std::str::FromStr;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use thiserror::Error;
use url::Url;

/// Default bucket holding uploaded résumés
const DEFAULT_BUCKET: &str = "curriculos";
/// LocalStack endpoint used in development
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
const DEFAULT_EMAIL_FROM: &str = "Seu App <onboarding@resend.dev>";
const DEFAULT_FALLBACK_RECIPIENT: &str = "destinatario@teste.com";
/// 10 MiB
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Above the 30 s storage and 30 s email client timeouts combined
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 75;

/// Configuration that is missing or malformed at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set (or is blank)
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("{name} has an invalid value: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Returns the bucket name holding uploaded files
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        non_empty_var("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET.to_string())
    }

    /// Returns the endpoint URL to use for the storage service
    ///
    /// `STORAGE_ENDPOINT_URL` wins everywhere, development falls back to `LocalStack`
    /// and production/staging fall back to regular AWS endpoints.
    #[must_use]
    pub fn storage_endpoint_url(&self) -> Option<String> {
        non_empty_var("STORAGE_ENDPOINT_URL").or_else(|| match self {
            Self::Production | Self::Staging => None,
            Self::Development => Some(LOCALSTACK_ENDPOINT.to_string()),
        })
    }

    /// Base URL under which stored objects are publicly reachable
    ///
    /// For Supabase this is `<project url>/storage/v1/object/public`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` in production/staging when unset, and
    /// `ConfigError::Invalid` when the value is not an absolute URL
    pub fn storage_public_base_url(&self) -> Result<Url, ConfigError> {
        let raw = match (non_empty_var("STORAGE_PUBLIC_BASE_URL"), self) {
            (Some(value), _) => value,
            (None, Self::Development) => self
                .storage_endpoint_url()
                .unwrap_or_else(|| LOCALSTACK_ENDPOINT.to_string()),
            (None, Self::Production | Self::Staging) => {
                return Err(ConfigError::Missing("STORAGE_PUBLIC_BASE_URL"))
            }
        };

        Url::parse(&raw).map_err(|_| ConfigError::Invalid {
            name: "STORAGE_PUBLIC_BASE_URL",
            value: raw,
        })
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.storage_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Both LocalStack and Supabase's S3 gateway only speak path-style addressing
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if self.storage_endpoint_url().is_some() {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// API key for the Resend email provider
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` in production/staging when `RESEND_API_KEY` is unset
    pub fn resend_api_key(&self) -> Result<String, ConfigError> {
        match (non_empty_var("RESEND_API_KEY"), self) {
            (Some(key), _) => Ok(key),
            (None, Self::Development) => Ok("re_test_key".to_string()),
            (None, Self::Production | Self::Staging) => Err(ConfigError::Missing("RESEND_API_KEY")),
        }
    }

    /// Base URL of the Resend API
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when `RESEND_API_URL` is not an absolute URL
    pub fn resend_api_url(&self) -> Result<Url, ConfigError> {
        let raw =
            non_empty_var("RESEND_API_URL").unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string());
        Url::parse(&raw).map_err(|_| ConfigError::Invalid {
            name: "RESEND_API_URL",
            value: raw,
        })
    }

    /// Sender used for notification emails
    #[must_use]
    pub fn email_from(&self) -> String {
        non_empty_var("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string())
    }

    /// Recipient used when the upload form does not name one
    #[must_use]
    pub fn fallback_recipient_email(&self) -> String {
        non_empty_var("FALLBACK_RECIPIENT_EMAIL")
            .unwrap_or_else(|| DEFAULT_FALLBACK_RECIPIENT.to_string())
    }

    /// Largest accepted request body, in bytes
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when `MAX_UPLOAD_BYTES` is not a positive integer
    pub fn max_upload_bytes(&self) -> Result<usize, ConfigError> {
        parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Deadline for processing one upload, storage and email included
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when `REQUEST_TIMEOUT_SECS` is not a positive integer
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS).map(Duration::from_secs)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = non_empty_var(name) else {
        return Ok(default);
    };

    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}
