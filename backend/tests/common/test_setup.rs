use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, response::Response, Router};
use resume_backend::{
    mailer::mock::MockMailer,
    object_storage::mock::InMemoryObjectStore,
    server,
    types::Environment,
    upload::{NotificationSettings, UploadService},
};
use tower::ServiceExt;

pub const TEST_FROM: &str = "Seu App <onboarding@resend.dev>";
pub const TEST_FALLBACK_RECIPIENT: &str = "destinatario@teste.com";
pub const TEST_MAX_UPLOAD_BYTES: usize = 1024 * 1024;
pub const TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Router wired to in-memory storage and a recording mailer
pub struct TestContext {
    pub router: Router,
    pub store: Arc<InMemoryObjectStore>,
    pub mailer: Arc<MockMailer>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_dependencies(
            InMemoryObjectStore::new(),
            MockMailer::new(),
            TEST_MAX_UPLOAD_BYTES,
        )
    }

    pub fn with_dependencies(
        store: InMemoryObjectStore,
        mailer: MockMailer,
        max_upload_bytes: usize,
    ) -> Self {
        Self::build(
            store,
            mailer,
            max_upload_bytes,
            TEST_REQUEST_TIMEOUT,
            Environment::Development,
        )
    }

    /// Context whose uploads must finish within `request_timeout`
    pub fn with_request_timeout(store: InMemoryObjectStore, request_timeout: Duration) -> Self {
        Self::build(
            store,
            MockMailer::new(),
            TEST_MAX_UPLOAD_BYTES,
            request_timeout,
            Environment::Development,
        )
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self::build(
            InMemoryObjectStore::new(),
            MockMailer::new(),
            TEST_MAX_UPLOAD_BYTES,
            TEST_REQUEST_TIMEOUT,
            environment,
        )
    }

    fn build(
        store: InMemoryObjectStore,
        mailer: MockMailer,
        max_upload_bytes: usize,
        request_timeout: Duration,
        environment: Environment,
    ) -> Self {
        setup_test_env();

        let store = Arc::new(store);
        let mailer = Arc::new(mailer);
        let upload_service = Arc::new(
            UploadService::new(
                store.clone(),
                mailer.clone(),
                NotificationSettings {
                    from: TEST_FROM.to_string(),
                    fallback_recipient: TEST_FALLBACK_RECIPIENT.to_string(),
                },
            )
            .with_deadline(request_timeout),
        );

        let router = server::router(environment, upload_service, max_upload_bytes, request_timeout);

        Self {
            router,
            store,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }
}
