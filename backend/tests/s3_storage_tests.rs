//! Runs against LocalStack: `docker run -p 4566:4566 localstack/localstack`

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use resume_backend::{
    object_storage::{object_key_for, ObjectStore, S3ObjectStore},
    types::Environment,
};

async fn localstack_store() -> (Arc<S3Client>, S3ObjectStore) {
    let environment = Environment::Development;
    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let bucket_name = format!("curriculos-test-{}", std::process::id());

    s3_client
        .create_bucket()
        .bucket(&bucket_name)
        .send()
        .await
        .expect("LocalStack must be running");

    let store = S3ObjectStore::new(
        s3_client.clone(),
        bucket_name,
        environment.storage_public_base_url().unwrap(),
    );
    (s3_client, store)
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn test_s3_put_overwrites_same_key() {
    let (s3_client, store) = localstack_store().await;
    let key = object_key_for("curriculo.pdf");

    store
        .put_object(&key, Bytes::from_static(b"%PDF first"), "application/pdf")
        .await
        .unwrap();
    store
        .put_object(&key, Bytes::from_static(b"%PDF second"), "application/pdf")
        .await
        .unwrap();

    let object = s3_client
        .get_object()
        .bucket(store.bucket_name())
        .key(&key)
        .send()
        .await
        .unwrap();
    assert_eq!(object.content_type(), Some("application/pdf"));

    let body = object.body.collect().await.unwrap().into_bytes();
    assert_eq!(body, Bytes::from_static(b"%PDF second"));
}

#[tokio::test]
#[ignore = "requires LocalStack on localhost:4566"]
async fn test_s3_public_url_points_at_object() {
    let (_, store) = localstack_store().await;

    let url = store.public_url("public/curriculo.pdf").unwrap();

    assert_eq!(
        url,
        format!(
            "http://localhost:4566/{}/public/curriculo.pdf",
            store.bucket_name()
        )
    );
}
