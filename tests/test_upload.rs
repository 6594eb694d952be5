//! Upload bridge against a fake storage endpoint.

mod common;

use axum::http::StatusCode;
use better_days_closet::TransactionMonitor;
use common::{client, settings, spawn_app, FakePlatform, UNREACHABLE};
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

fn image_form(name: &str) -> Form {
    Form::new().part(
        "file",
        Part::bytes(vec![0x89, b'P', b'N', b'G', 1, 2, 3])
            .file_name(name.to_string())
            .mime_str("image/png")
            .unwrap(),
    )
}

#[tokio::test]
async fn missing_file_part_is_rejected_without_touching_storage() {
    let fake = FakePlatform::default();
    let platform_url = fake.start().await;
    let base_url = spawn_app(&settings(UNREACHABLE, &platform_url), TransactionMonitor::new()).await;

    let resp = client()
        .post(format!("{}/api/upload", base_url))
        .multipart(Form::new().text("bucket", "avatars"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: JsonValue = resp.json().await.unwrap();
    assert_eq!(err["error"], "No file provided");
    assert_eq!(fake.upload_count(), 0);
}

#[tokio::test]
async fn repeated_uploads_of_the_same_name_get_distinct_paths() {
    let fake = FakePlatform::default();
    let platform_url = fake.start().await;
    let base_url = spawn_app(&settings(UNREACHABLE, &platform_url), TransactionMonitor::new()).await;
    let http = client();

    let mut paths = HashSet::new();
    for _ in 0..3 {
        let resp = http
            .post(format!("{}/api/upload", base_url))
            .multipart(image_form("Summer Dress.PNG"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: JsonValue = resp.json().await.unwrap();
        let path = body["path"].as_str().unwrap().to_string();
        assert!(path.ends_with(".png"));
        assert_eq!(
            body["publicUrl"],
            format!("{}/storage/v1/object/public/product-images/{}", platform_url, path)
        );
        paths.insert(path);
    }
    assert_eq!(paths.len(), 3);

    let uploads = fake.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 3);
    assert!(uploads.iter().all(|u| u.bucket == "product-images"));
    assert!(uploads.iter().all(|u| u.bytes == 7));
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(uploads[0].api_key.as_deref(), Some("service-role-key"));
}

#[tokio::test]
async fn explicit_bucket_is_used() {
    let fake = FakePlatform::default();
    let platform_url = fake.start().await;
    let base_url = spawn_app(&settings(UNREACHABLE, &platform_url), TransactionMonitor::new()).await;

    let resp = client()
        .post(format!("{}/api/upload", base_url))
        .multipart(image_form("banner.png").text("bucket", "banners"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: JsonValue = resp.json().await.unwrap();
    assert!(body["publicUrl"]
        .as_str()
        .unwrap()
        .contains("/storage/v1/object/public/banners/"));
    assert_eq!(fake.uploads.lock().unwrap()[0].bucket, "banners");
}

#[tokio::test]
async fn storage_failure_propagates_the_provider_message() {
    let fake = FakePlatform {
        fail_uploads: true,
        ..FakePlatform::default()
    };
    let platform_url = fake.start().await;
    let base_url = spawn_app(&settings(UNREACHABLE, &platform_url), TransactionMonitor::new()).await;

    let resp = client()
        .post(format!("{}/api/upload", base_url))
        .multipart(image_form("photo.png"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: JsonValue = resp.json().await.unwrap();
    assert_eq!(err["error"], "Bucket not found");
}

#[tokio::test]
async fn dot_only_bucket_names_are_rejected() {
    let fake = FakePlatform::default();
    let platform_url = fake.start().await;
    let base_url = spawn_app(&settings(UNREACHABLE, &platform_url), TransactionMonitor::new()).await;
    let http = client();

    for bucket in [".", "..."] {
        let resp = http
            .post(format!("{}/api/upload", base_url))
            .multipart(image_form("dress.png").text("bucket", bucket))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "bucket: {}", bucket);
    }
    assert_eq!(fake.upload_count(), 0);
}
