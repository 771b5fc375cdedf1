//! Integration tests for advertisement CRUD and creative uploads.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use serde_json::json;

use tigube_admin::db::{AdvertisementRepository, ImageUpload, RepositoryError};
use tigube_admin::models::advertisement::{AdvertisementDraft, IMAGE_BUCKET};
use tigube_core::{AdFormatId, AdvertisementId, UserId};
use tigube_integration_tests::{FakeBackend, Stub};

const AD: &str = "5b1e0c7a-3f2d-4c9e-8a6b-1d2e3f4a5b6c";
const COPY: &str = "9c8b7a6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";
const FORMAT: &str = "c0ffee00-1234-4abc-8def-0123456789ab";
const ADMIN: &str = "a1b2c3d4-0000-4000-8000-000000000001";

fn ad_row(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "ad_type": "banner",
        "target_pet_types": null,
        "target_subscription_types": ["free"],
        "is_active": true,
        "priority": 5,
        "current_impressions": 1200,
        "current_clicks": 34,
        "format_id": FORMAT,
    })
}

// =============================================================================
// Create and Update
// =============================================================================

#[tokio::test]
async fn test_create_copies_ad_type_from_format() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::get("/rest/v1/advertisement_formats")
            .param("id", &format!("eq.{FORMAT}"))
            .json(json!({ "ad_type": "sidebar" })),
    );
    backend.stub(Stub::post("/rest/v1/advertisements").json(json!([ad_row(AD, "Hundefutter")])));
    let client = backend.client();

    let draft = AdvertisementDraft {
        title: Some("Hundefutter".to_string()),
        format_id: Some(FORMAT.parse::<AdFormatId>().unwrap()),
        ..AdvertisementDraft::new_defaults()
    };
    let created = AdvertisementRepository::new(&client)
        .create(&draft, Some(ADMIN.parse::<UserId>().unwrap()))
        .await
        .unwrap();

    assert_eq!(created.id, AD.parse::<AdvertisementId>().unwrap());

    let insert = &backend.requests_to(&Method::POST, "/rest/v1/advertisements")[0];
    assert!(
        insert
            .prefer
            .as_deref()
            .unwrap_or_default()
            .contains("return=representation")
    );
    let body = insert.json();
    assert_eq!(body["ad_type"], json!("sidebar"));
    assert_eq!(body["title"], json!("Hundefutter"));
    assert_eq!(body["created_by"], json!(ADMIN));
    assert_eq!(body["target_subscription_types"], json!(["free"]));
}

#[tokio::test]
async fn test_create_with_unknown_format_is_not_found() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let draft = AdvertisementDraft {
        format_id: Some(FORMAT.parse::<AdFormatId>().unwrap()),
        ..AdvertisementDraft::new_defaults()
    };
    let result = AdvertisementRepository::new(&client).create(&draft, None).await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert!(
        backend
            .requests_to(&Method::POST, "/rest/v1/advertisements")
            .is_empty()
    );
}

#[tokio::test]
async fn test_update_missing_ad_is_not_found() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let result = AdvertisementRepository::new(&client)
        .update(AD.parse().unwrap(), &AdvertisementDraft::new_defaults())
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

// =============================================================================
// Duplicate
// =============================================================================

#[tokio::test]
async fn test_duplicate_inserts_inactive_copy_with_reset_counters() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::get("/rest/v1/advertisements")
            .param("id", &format!("eq.{AD}"))
            .json(ad_row(AD, "Katzenstreu")),
    );
    backend.stub(
        Stub::post("/rest/v1/advertisements")
            .json(json!([ad_row(COPY, "Katzenstreu (Kopie)")])),
    );
    let client = backend.client();

    let copy = AdvertisementRepository::new(&client)
        .duplicate(AD.parse().unwrap(), None)
        .await
        .unwrap();

    assert_eq!(copy.id, COPY.parse::<AdvertisementId>().unwrap());
    let body = backend.requests_to(&Method::POST, "/rest/v1/advertisements")[0].json();
    assert_eq!(body["title"], json!("Katzenstreu (Kopie)"));
    assert_eq!(body["is_active"], json!(false));
    assert_eq!(body["current_impressions"], json!(0));
    assert_eq!(body["current_clicks"], json!(0));
    assert_eq!(body["format_id"], json!(FORMAT));
    assert!(body.get("id").is_none());
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_stores_object_and_returns_public_url() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let url = AdvertisementRepository::new(&client)
        .upload_image(ImageUpload {
            file_name: "Banner.PNG".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        })
        .await
        .unwrap();

    let prefix = format!("/storage/v1/object/{IMAGE_BUCKET}/ads/");
    let uploads: Vec<_> = backend
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::POST && r.path.starts_with(&prefix))
        .collect();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].path.ends_with(".png"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(uploads[0].body.len(), 4);

    let object = uploads[0].path.trim_start_matches(&format!("/storage/v1/object/{IMAGE_BUCKET}/"));
    assert_eq!(
        url,
        format!("{}storage/v1/object/public/{IMAGE_BUCKET}/{object}", backend.url())
    );
}

#[tokio::test]
async fn test_upload_rejects_non_images_before_calling_storage() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let result = AdvertisementRepository::new(&client)
        .upload_image(ImageUpload {
            file_name: "vertrag.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::Validation(_))));
    assert!(backend.requests().is_empty());
}
