//! Integration tests for the Tigube admin panel.
//!
//! The admin owns no database, so the tests run against [`FakeBackend`]: an
//! in-process HTTP server that answers on the Supabase REST, auth and storage
//! paths with canned responses and records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tigube-integration-tests
//! ```
//!
//! # Stubbing
//!
//! Stubs are matched in registration order on method, path and any query
//! parameters they name. Unmatched requests get an empty answer: `[]` with a
//! zero `Content-Range` for reads, `PGRST116` for single-object reads.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use tigube_admin::auth::AuthTimings;
use tigube_admin::config::{AdminConfig, SupabaseConfig};
use tigube_admin::state::AppState;
use tigube_admin::supabase::{NO_ROWS_CODE, SupabaseClient};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

// =============================================================================
// Stubs
// =============================================================================

/// A canned response for matching requests.
#[derive(Debug, Clone)]
pub struct Stub {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    status: StatusCode,
    body: Value,
    total: Option<u64>,
}

impl Stub {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            params: Vec::new(),
            status: StatusCode::OK,
            body: json!([]),
            total: None,
        }
    }

    /// GET on a path.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// HEAD on a path.
    #[must_use]
    pub fn head(path: &str) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// POST on a path.
    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// PATCH on a path.
    #[must_use]
    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Only match requests carrying this query parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Respond with this JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Respond with this status.
    #[must_use]
    pub const fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Send `Content-Range` with this total.
    #[must_use]
    pub const fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    fn matches(&self, request: &RecordedRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .params
                .iter()
                .all(|(k, v)| request.param(k) == Some(v.as_str()))
    }

    fn respond(&self) -> Response {
        let mut response = (self.status, axum::Json(self.body.clone())).into_response();
        if let Some(total) = self.total {
            let rows = self.body.as_array().map_or(0, Vec::len) as u64;
            let range = if rows == 0 {
                format!("*/{total}")
            } else {
                format!("0-{}/{total}", rows - 1)
            };
            if let Ok(value) = HeaderValue::from_str(&range) {
                response.headers_mut().insert("content-range", value);
            }
        }
        response
    }
}

// =============================================================================
// Recorded Requests
// =============================================================================

/// A request received by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub prefer: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    /// First value of a query parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON (`Null` when it is not JSON).
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    fn wants_single(&self) -> bool {
        self.accept.as_deref() == Some(SINGLE_OBJECT)
    }
}

#[derive(Default)]
struct Recorder {
    stubs: Vec<Stub>,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<Recorder>>;

// =============================================================================
// Fake Backend
// =============================================================================

/// In-process stand-in for a Supabase project.
pub struct FakeBackend {
    addr: SocketAddr,
    shared: Shared,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let shared = Shared::default();
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared }
    }

    /// Base URL of the fake project.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Invalid fake backend URL")
    }

    /// Project configuration with a service role key.
    #[must_use]
    pub fn supabase_config(&self) -> SupabaseConfig {
        SupabaseConfig {
            url: self.url(),
            anon_key: SecretString::from("test-anon-key"),
            service_role_key: Some(SecretString::from("test-service-role-key")),
        }
    }

    /// Client pointed at the fake.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> SupabaseClient {
        SupabaseClient::new(&self.supabase_config()).expect("Failed to build client")
    }

    /// Admin configuration for plain HTTP on localhost.
    #[must_use]
    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost:3001".to_string(),
            supabase: self.supabase_config(),
            auth_timings: AuthTimings::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        }
    }

    /// Application state wired to the fake.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState::from_parts(self.admin_config(), self.client())
    }

    /// Register a stub. Earlier stubs win.
    pub fn stub(&self, stub: Stub) {
        self.lock().stubs.push(stub);
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests with this method and path.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorder> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn handle(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    let request = RecordedRequest {
        method,
        path: uri.path().to_string(),
        params: url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect(),
        prefer: header("prefer"),
        accept: header("accept"),
        content_type: header("content-type"),
        body,
    };

    let mut recorder = shared.lock().unwrap_or_else(PoisonError::into_inner);
    let response = recorder
        .stubs
        .iter()
        .find(|stub| stub.matches(&request))
        .map_or_else(|| default_response(&request), Stub::respond);
    recorder.requests.push(request);
    response
}

/// Answer for requests no stub matched.
fn default_response(request: &RecordedRequest) -> Response {
    if request.wants_single() {
        return (
            StatusCode::NOT_ACCEPTABLE,
            axum::Json(json!({
                "code": NO_ROWS_CODE,
                "message": "JSON object requested, multiple (or no) rows returned",
            })),
        )
            .into_response();
    }
    let mut response = (StatusCode::OK, axum::Json(json!([]))).into_response();
    response
        .headers_mut()
        .insert("content-range", HeaderValue::from_static("*/0"));
    response
}

/// A user row as `PostgREST` returns it from `users`.
#[must_use]
pub fn user_row(id: &str, email: &str, user_type: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "first_name": "Anna",
        "last_name": "Schmidt",
        "user_type": user_type,
        "created_at": "2026-03-01T10:00:00Z",
        "is_suspended": false,
        "verification_status": "pending",
        "subscription_status": "free",
        "is_admin": false,
        "plan_type": "free",
        "show_ads": true,
        "premium_badge": false,
        "max_contact_requests": 3,
        "max_bookings": 3,
        "search_priority": 0,
    })
}

/// Token endpoint answer for a password or refresh grant.
#[must_use]
pub fn token_response(user_id: &str, email: &str) -> Value {
    json!({
        "access_token": "access-token",
        "refresh_token": "refresh-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": user_id, "email": email },
    })
}
