//! Object storage for uploaded résumés
//!
//! Files land in an S3-compatible bucket (Supabase Storage in production, `LocalStack`
//! in development) under a key derived from the client-supplied file name, and are
//! served back through a public URL.
mod error;

use std::sync::Arc;

use aws_sdk_s3::{error::SdkError, primitives::ByteStream, Client as S3Client};
use bytes::Bytes;
use url::Url;

pub use error::{BucketError, BucketResult};

/// Folder every uploaded file is stored under
pub const UPLOAD_PREFIX: &str = "public/";

/// Maps a client-supplied file name to its object key.
///
/// The key is not unique: two uploads with the same file name share it.
#[must_use]
pub fn object_key_for(file_name: &str) -> String {
    format!("{UPLOAD_PREFIX}{file_name}")
}

/// Builds the public URL of `key` inside `bucket`.
///
/// Each path segment of the key is percent-encoded, so `public/Meu CV.pdf` becomes
/// `<base>/<bucket>/public/Meu%20CV.pdf`.
///
/// # Errors
///
/// Returns `BucketError::InvalidInput` for an empty key and
/// `BucketError::ConfigError` when `base` cannot carry a path
pub fn public_object_url(base: &Url, bucket: &str, key: &str) -> BucketResult<String> {
    if key.is_empty() {
        return Err(BucketError::InvalidInput("object key is empty".to_string()));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| BucketError::ConfigError(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/'));

    Ok(url.to_string())
}

/// Storage backend for uploaded files
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` at `key`, replacing any object already stored there
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> BucketResult<()>;

    /// Durable, publicly reachable URL of the object at `key`
    fn public_url(&self, key: &str) -> BucketResult<String>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    public_base_url: Url,
}

impl S3ObjectStore {
    /// Creates a new S3 object store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - Bucket holding uploaded files
    /// * `public_base_url` - Base URL objects are publicly served from
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String, public_base_url: Url) -> Self {
        Self {
            s3_client,
            bucket_name,
            public_base_url,
        }
    }

    /// Bucket this store writes to
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    /// # Errors
    ///
    /// Returns `BucketError::UpstreamError` for 5xx responses, `BucketError::S3Error`
    /// for other service errors and `BucketError::AwsError` when the request never
    /// got a response
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> BucketResult<()> {
        let size = body.len();
        let result = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(key, size, "stored object");
                Ok(())
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(BucketError::UpstreamError(format!("{service_err:?}")))
            }
            Err(e) => Err(BucketError::from(e)),
        }
    }

    fn public_url(&self, key: &str) -> BucketResult<String> {
        public_object_url(&self.public_base_url, &self.bucket_name, key)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use bytes::Bytes;
    use url::Url;

    use super::{public_object_url, BucketError, BucketResult, ObjectStore};

    /// Bucket name reported by the in-memory store
    pub const MOCK_BUCKET: &str = "curriculos";
    /// Base URL reported by the in-memory store
    pub const MOCK_PUBLIC_BASE_URL: &str = "https://storage.test/storage/v1/object/public";

    /// An object held by [`InMemoryObjectStore`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoredObject {
        pub body: Bytes,
        pub content_type: String,
    }

    /// Object store keeping everything in a map, optionally failing or stalling
    pub struct InMemoryObjectStore {
        objects: Mutex<HashMap<String, StoredObject>>,
        fail_puts: AtomicBool,
        fail_public_url: AtomicBool,
        put_delay: Mutex<Option<Duration>>,
        put_attempts: AtomicUsize,
        public_base_url: Url,
    }

    impl InMemoryObjectStore {
        /// # Panics
        ///
        /// Never: the mock base URL is a valid constant
        #[must_use]
        pub fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                fail_puts: AtomicBool::new(false),
                fail_public_url: AtomicBool::new(false),
                put_delay: Mutex::new(None),
                put_attempts: AtomicUsize::new(0),
                public_base_url: Url::parse(MOCK_PUBLIC_BASE_URL).expect("valid mock URL"),
            }
        }

        /// A store whose writes are rejected
        #[must_use]
        pub fn failing() -> Self {
            let store = Self::new();
            store.set_fail_puts(true);
            store
        }

        pub fn set_fail_puts(&self, fail: bool) {
            self.fail_puts.store(fail, Ordering::SeqCst);
        }

        /// Writes still succeed, URL lookups fail
        pub fn set_fail_public_url(&self, fail: bool) {
            self.fail_public_url.store(fail, Ordering::SeqCst);
        }

        /// Every write sleeps for `delay` before landing
        pub fn set_put_delay(&self, delay: Duration) {
            *self.put_delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
        }

        #[must_use]
        pub fn object(&self, key: &str) -> Option<StoredObject> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        }

        #[must_use]
        pub fn object_count(&self) -> usize {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Number of writes attempted, failed ones included
        #[must_use]
        pub fn put_attempts(&self) -> usize {
            self.put_attempts.load(Ordering::SeqCst)
        }
    }

    impl Default for InMemoryObjectStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn put_object(
            &self,
            key: &str,
            body: Bytes,
            content_type: &str,
        ) -> BucketResult<()> {
            self.put_attempts.fetch_add(1, Ordering::SeqCst);

            let delay = *self.put_delay.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(BucketError::UpstreamError(
                    "simulated storage outage".to_string(),
                ));
            }

            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    key.to_string(),
                    StoredObject {
                        body,
                        content_type: content_type.to_string(),
                    },
                );
            Ok(())
        }

        fn public_url(&self, key: &str) -> BucketResult<String> {
            if self.fail_public_url.load(Ordering::SeqCst) {
                return Err(BucketError::ConfigError(
                    "simulated public URL failure".to_string(),
                ));
            }
            public_object_url(&self.public_base_url, MOCK_BUCKET, key)
        }
    }
}
