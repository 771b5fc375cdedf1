//! Integration tests for moderation, verification and the blog CMS.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use tigube_admin::db::{BlogRepository, ContentRepository, RepositoryError, VerificationRepository};
use tigube_admin::models::BlogDraft;
use tigube_core::{ModerationAction, ModerationStatus, PostStatus, UserId};
use tigube_integration_tests::{FakeBackend, Stub};

const REVIEW: &str = "7d1c2b3a-4e5f-4061-8a7b-9c0d1e2f3a4b";
const REQUEST: &str = "2b3c4d5e-6f70-4182-93a4-b5c6d7e8f901";
const OWNER: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
const ADMIN: &str = "a1b2c3d4-0000-4000-8000-000000000001";

fn admin() -> UserId {
    ADMIN.parse().unwrap()
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_pending_reviews_include_unmoderated_rows() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    ContentRepository::new(&client)
        .reviews(ModerationStatus::Pending)
        .await
        .unwrap();
    ContentRepository::new(&client)
        .reviews(ModerationStatus::Flagged)
        .await
        .unwrap();

    let requests = backend.requests_to(&Method::GET, "/rest/v1/reviews");
    assert_eq!(
        requests[0].param("or"),
        Some("(moderation_status.eq.pending,moderation_status.is.null)")
    );
    assert_eq!(requests[1].param("moderation_status"), Some("eq.flagged"));
    assert!(requests[1].param("or").is_none());
}

#[tokio::test]
async fn test_flagging_a_review_records_moderator() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::patch("/rest/v1/reviews").json(json!([{ "id": REVIEW }])));
    let client = backend.client();

    ContentRepository::new(&client)
        .moderate(REVIEW.parse().unwrap(), ModerationAction::Flag, admin())
        .await
        .unwrap();

    let body = backend.requests_to(&Method::PATCH, "/rest/v1/reviews")[0].json();
    assert_eq!(body["moderation_status"], json!("flagged"));
    assert_eq!(body["moderated_by"], json!(ADMIN));
}

#[tokio::test]
async fn test_moderating_missing_review_is_not_found() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let result = ContentRepository::new(&client)
        .moderate(REVIEW.parse().unwrap(), ModerationAction::Approve, admin())
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn test_approving_request_marks_user_verified() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::patch("/rest/v1/verification_requests").json(json!([{
            "id": REQUEST,
            "user_id": OWNER,
            "status": "approved",
        }])),
    );
    let client = backend.client();

    VerificationRepository::new(&client)
        .approve(REQUEST.parse().unwrap(), admin())
        .await
        .unwrap();

    let decision = backend.requests_to(&Method::PATCH, "/rest/v1/verification_requests")[0].json();
    assert_eq!(decision["status"], json!("approved"));
    assert_eq!(decision["reviewed_by"], json!(ADMIN));

    let mirror = &backend.requests_to(&Method::PATCH, "/rest/v1/users")[0];
    assert_eq!(mirror.param("id"), Some(format!("eq.{OWNER}").as_str()));
    assert_eq!(mirror.json()["verification_status"], json!("approved"));
}

#[tokio::test]
async fn test_rejecting_unknown_request_leaves_user_alone() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let result = VerificationRepository::new(&client)
        .reject(REQUEST.parse().unwrap(), Some("Unscharf".to_string()), admin())
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert!(backend.requests_to(&Method::PATCH, "/rest/v1/users").is_empty());
}

// =============================================================================
// Blog
// =============================================================================

#[tokio::test]
async fn test_duplicate_slug_is_reported_as_unique_violation() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::post("/rest/v1/blog_posts")
            .status(StatusCode::CONFLICT)
            .json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"blog_posts_slug_key\"",
            })),
    );
    let client = backend.client();

    let draft = BlogDraft {
        title: "Sommer mit Hund".to_string(),
        slug: "sommer-mit-hund".to_string(),
        excerpt: None,
        content: Some("Viel trinken.".to_string()),
        cover_image_url: None,
        status: PostStatus::Published,
    };
    let result = BlogRepository::new(&client).create(&draft, admin()).await;

    match result {
        Err(RepositoryError::Backend(e)) => assert!(e.is_unique_violation()),
        other => panic!("expected unique violation, got {other:?}"),
    }
    let body = backend.requests_to(&Method::POST, "/rest/v1/blog_posts")[0].json();
    assert!(body["published_at"].is_string());
    assert_eq!(body["author_id"], json!(ADMIN));
}

#[tokio::test]
async fn test_withdrawing_post_clears_publish_date() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::patch("/rest/v1/blog_posts").json(json!([{ "id": REVIEW }])));
    let client = backend.client();

    BlogRepository::new(&client)
        .set_published(REVIEW.parse().unwrap(), false)
        .await
        .unwrap();

    let body = backend.requests_to(&Method::PATCH, "/rest/v1/blog_posts")[0].json();
    assert_eq!(body["status"], json!("draft"));
    assert!(body["published_at"].is_null());
}
