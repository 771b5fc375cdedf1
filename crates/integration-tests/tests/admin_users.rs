//! Integration tests for the user repository against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use tigube_admin::db::{RepositoryError, UserRepository};
use tigube_core::{ApprovalStatus, Email, UserId};
use tigube_integration_tests::{FakeBackend, Stub, user_row};

const ANNA: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
const BEN: &str = "0f7c2a31-5d2e-4a8b-9f41-2c6d8e1b3a90";
const ADMIN: &str = "a1b2c3d4-0000-4000-8000-000000000001";

fn id(raw: &str) -> UserId {
    raw.parse().unwrap()
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_reads_total_and_requests_page_window() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::get("/rest/v1/users")
            .json(json!([
                user_row(ANNA, "anna@example.de", "owner"),
                user_row(BEN, "ben@example.de", "caretaker"),
            ]))
            .total(120),
    );
    let client = backend.client();

    let page = UserRepository::new(&client).list(3, 50).await.unwrap();

    assert_eq!(page.total, 120);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.rows[0].email.as_deref(), Some("anna@example.de"));

    let requests = backend.requests_to(&Method::GET, "/rest/v1/users");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].param("offset"), Some("100"));
    assert_eq!(requests[0].param("limit"), Some("50"));
    assert_eq!(requests[0].param("order"), Some("created_at.desc"));
    assert!(
        requests[0]
            .prefer
            .as_deref()
            .unwrap_or_default()
            .contains("count=exact")
    );
}

#[tokio::test]
async fn test_list_flattens_approval_embed() {
    let backend = FakeBackend::start().await;
    let mut row = user_row(BEN, "ben@example.de", "caretaker");
    row["caretaker_profiles"] = json!([{ "approval_status": "pending", "approval_notes": null }]);
    backend.stub(Stub::get("/rest/v1/users").json(json!([row])).total(1));
    let client = backend.client();

    let page = UserRepository::new(&client).list(1, 50).await.unwrap();

    assert_eq!(page.rows[0].approval_status, ApprovalStatus::Pending);
}

#[tokio::test]
async fn test_pending_approvals_drops_approved_users() {
    let backend = FakeBackend::start().await;
    let mut pending = user_row(ANNA, "anna@example.de", "caretaker");
    pending["caretaker_profiles"] = json!({ "approval_status": "pending" });
    let mut approved = user_row(BEN, "ben@example.de", "dienstleister");
    approved["caretaker_profiles"] = json!({ "approval_status": "approved" });
    backend.stub(Stub::get("/rest/v1/users").json(json!([pending, approved])));
    let client = backend.client();

    let users = UserRepository::new(&client)
        .pending_approvals(50)
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, id(ANNA));

    let request = &backend.requests_to(&Method::GET, "/rest/v1/users")[0];
    let types = request.param("user_type").unwrap();
    assert!(types.starts_with("in.("));
    assert!(types.contains("caretaker"));
    assert!(!types.contains("owner"));
}

// =============================================================================
// Lookups
// =============================================================================

#[tokio::test]
async fn test_get_missing_user_is_not_found() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let result = UserRepository::new(&client).get(id(ANNA)).await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_find_by_email() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::get("/rest/v1/users")
            .param("email", "eq.anna@example.de")
            .json(user_row(ANNA, "anna@example.de", "owner")),
    );
    let client = backend.client();
    let repo = UserRepository::new(&client);

    let found = repo
        .find_by_email(&Email::parse("anna@example.de").unwrap())
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(id(ANNA)));

    let missing = repo
        .find_by_email(&Email::parse("nobody@example.de").unwrap())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_backend_failure_surfaces_as_backend_error() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::get("/rest/v1/users")
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .json(json!({ "message": "database unavailable" })),
    );
    let client = backend.client();

    let result = UserRepository::new(&client).list(1, 50).await;

    assert!(matches!(result, Err(RepositoryError::Backend(_))));
}

// =============================================================================
// Admin Toggles
// =============================================================================

#[tokio::test]
async fn test_suspend_writes_reason_and_actor() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::patch("/rest/v1/users").json(json!([{ "id": ANNA }])));
    let client = backend.client();

    UserRepository::new(&client)
        .set_suspended(id(ANNA), true, Some("Spam".to_string()), Some(id(ADMIN)))
        .await
        .unwrap();

    let patch = &backend.requests_to(&Method::PATCH, "/rest/v1/users")[0];
    assert_eq!(patch.param("id"), Some(format!("eq.{ANNA}").as_str()));
    let body = patch.json();
    assert_eq!(body["is_suspended"], json!(true));
    assert_eq!(body["suspension_reason"], json!("Spam"));
    assert_eq!(body["suspended_by"], json!(ADMIN));
    assert!(body["suspended_at"].is_string());
}

#[tokio::test]
async fn test_unsuspend_clears_suspension_columns() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::patch("/rest/v1/users").json(json!([{ "id": ANNA }])));
    let client = backend.client();

    UserRepository::new(&client)
        .set_suspended(id(ANNA), false, Some("ignored".to_string()), Some(id(ADMIN)))
        .await
        .unwrap();

    let body = backend.requests_to(&Method::PATCH, "/rest/v1/users")[0].json();
    assert_eq!(body["is_suspended"], json!(false));
    assert!(body["suspended_at"].is_null());
    assert!(body["suspension_reason"].is_null());
    assert!(body["suspended_by"].is_null());
}

#[tokio::test]
async fn test_toggle_on_missing_user_is_not_found() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let result = UserRepository::new(&client).set_admin(id(ANNA), true).await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_grant_admin_sets_role() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::patch("/rest/v1/users").json(json!([{ "id": ANNA }])));
    let client = backend.client();
    let repo = UserRepository::new(&client);

    repo.set_admin(id(ANNA), true).await.unwrap();
    repo.set_admin(id(ANNA), false).await.unwrap();

    let patches = backend.requests_to(&Method::PATCH, "/rest/v1/users");
    assert_eq!(patches[0].json()["admin_role"], json!("admin"));
    assert_eq!(patches[1].json()["is_admin"], json!(false));
    assert!(patches[1].json()["admin_role"].is_null());
}

// =============================================================================
// Approval
// =============================================================================

#[tokio::test]
async fn test_approval_updates_existing_profile() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::patch("/rest/v1/caretaker_profiles").json(json!([{ "id": BEN }])));
    let client = backend.client();

    UserRepository::new(&client)
        .approve(id(BEN), id(ADMIN))
        .await
        .unwrap();

    let patch = &backend.requests_to(&Method::PATCH, "/rest/v1/caretaker_profiles")[0];
    assert_eq!(patch.json()["approval_status"], json!("approved"));
    assert!(
        backend
            .requests_to(&Method::POST, "/rest/v1/caretaker_profiles")
            .is_empty()
    );
}

#[tokio::test]
async fn test_approval_creates_missing_profile() {
    let backend = FakeBackend::start().await;
    backend.stub(Stub::post("/rest/v1/caretaker_profiles").json(json!([{ "id": BEN }])));
    let client = backend.client();

    UserRepository::new(&client)
        .reject(id(BEN), Some("Unterlagen fehlen".to_string()), id(ADMIN))
        .await
        .unwrap();

    let inserts = backend.requests_to(&Method::POST, "/rest/v1/caretaker_profiles");
    assert_eq!(inserts.len(), 1);
    let body = inserts[0].json();
    assert_eq!(body["id"], json!(BEN));
    assert_eq!(body["approval_status"], json!("rejected"));
    assert_eq!(body["approval_notes"], json!("Unterlagen fehlen"));
}
