//! Integration tests for the dashboard counters and analytics series.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;

use tigube_admin::db::{AnalyticsRepository, DashboardRepository};
use tigube_admin::models::{DashboardStats, Timeframe};
use tigube_integration_tests::{FakeBackend, Stub};

/// Counts for every table; owners are stubbed before the catch-all.
fn stub_counts(backend: &FakeBackend) {
    backend.stub(
        Stub::head("/rest/v1/users")
            .param("user_type", "eq.owner")
            .total(7),
    );
    backend.stub(Stub::head("/rest/v1/users").total(20));
    backend.stub(Stub::head("/rest/v1/messages").total(50));
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_failed_count_is_zero_and_others_survive() {
    let backend = FakeBackend::start().await;
    backend.stub(
        Stub::head("/rest/v1/conversations")
            .status(StatusCode::INTERNAL_SERVER_ERROR),
    );
    stub_counts(&backend);
    let client = backend.client();

    let stats = DashboardRepository::new(&client).stats().await;

    assert_eq!(stats.total_conversations, 0);
    assert_eq!(stats.total_users, 20);
    assert_eq!(stats.total_owners, 7);
    assert_eq!(stats.total_messages, 50);
    // Caretakers plus service providers, both answered by the catch-all.
    assert_eq!(stats.total_caretakers, 40);
    assert_eq!(stats.total_revenue, 0);
    assert_eq!(backend.requests_to(&Method::HEAD, "/rest/v1/users").len(), 6);
}

#[tokio::test]
async fn test_slow_load_falls_back_to_zeros() {
    let backend = FakeBackend::start().await;
    stub_counts(&backend);
    let client = backend.client();

    let stats = DashboardRepository::new(&client)
        .stats_within(Duration::ZERO)
        .await;

    assert_eq!(stats, DashboardStats::default());
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn test_message_activity_counts_every_batch() {
    let backend = FakeBackend::start().await;
    let stamp = json!({ "created_at": Utc::now().to_rfc3339() });
    backend.stub(
        Stub::get("/rest/v1/messages")
            .param("offset", "0")
            .json(json!(vec![stamp.clone(); 1000])),
    );
    backend.stub(
        Stub::get("/rest/v1/messages")
            .param("offset", "1000")
            .json(json!(vec![stamp; 5])),
    );
    let client = backend.client();

    let overview = AnalyticsRepository::new(&client)
        .overview(Timeframe::Quarter)
        .await
        .unwrap();

    let messages: u64 = overview.message_activity.iter().map(|d| d.count).sum();
    assert_eq!(messages, 1005);
    assert_eq!(overview.message_activity.len(), 90);
    assert_eq!(backend.requests_to(&Method::GET, "/rest/v1/messages").len(), 2);
}
