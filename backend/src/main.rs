use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use resume_backend::{
    mailer::ResendMailer,
    object_storage::S3ObjectStore,
    server,
    types::Environment,
    upload::{NotificationSettings, UploadService},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    // Configure logging format based on environment
    // Use JSON format for staging/production (Datadog), regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    // Configuration is validated before any client is built
    let bucket_name = environment.s3_bucket();
    let public_base_url = environment.storage_public_base_url()?;
    let resend_api_url = environment.resend_api_url()?;
    let resend_api_key = environment.resend_api_key()?;
    let max_upload_bytes = environment.max_upload_bytes()?;
    let request_timeout = environment.request_timeout()?;
    let settings = NotificationSettings {
        from: environment.email_from(),
        fallback_recipient: environment.fallback_recipient_email(),
    };

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let object_store = Arc::new(S3ObjectStore::new(s3_client, bucket_name, public_base_url));
    tracing::info!(
        "✅ Initialized object storage for bucket {}",
        object_store.bucket_name()
    );

    let mailer = Arc::new(ResendMailer::new(&resend_api_url, resend_api_key)?);
    tracing::info!("✅ Initialized Resend mailer");

    let upload_service =
        Arc::new(UploadService::new(object_store, mailer, settings).with_deadline(request_timeout));

    server::start(environment, upload_service, max_upload_bytes, request_timeout).await
}
