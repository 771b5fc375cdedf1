//! HTTP client for the Supabase REST, auth and storage endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use super::query::{Query, parse_content_range};
use super::SupabaseError;
use crate::config::SupabaseConfig;

/// Request timeout for every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one Supabase project.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    data_key: SecretString,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Error body shapes returned by `PostgREST` and `GoTrue`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl SupabaseClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        if !config.has_service_role() {
            tracing::warn!(
                "SUPABASE_SERVICE_ROLE_KEY not set; table access uses the anon key and row-level security may hide rows"
            );
        }

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                data_key: config.data_key().clone(),
            }),
        })
    }

    // =========================================================================
    // URLs and request builders
    // =========================================================================

    /// Project base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn rest_url(&self, table: &str, query: &Query) -> String {
        let qs = query.to_query_string();
        if qs.is_empty() {
            format!("{}/rest/v1/{table}", self.inner.base_url)
        } else {
            format!("{}/rest/v1/{table}?{qs}", self.inner.base_url)
        }
    }

    pub(super) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    pub(super) fn storage_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/{}",
            self.inner.base_url,
            path.trim_start_matches('/')
        )
    }

    /// Request authorized with the data key (service role or anon).
    pub(super) fn data_request(&self, method: Method, url: &str) -> RequestBuilder {
        let key = self.inner.data_key.expose_secret();
        self.inner
            .http
            .request(method, url)
            .header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    /// Request carrying the anon key and, optionally, a user's access token.
    pub(super) fn auth_request(
        &self,
        method: Method,
        url: &str,
        access_token: Option<&SecretString>,
    ) -> RequestBuilder {
        let anon = self.inner.anon_key.expose_secret();
        let bearer = access_token.map_or(anon, |t| t.expose_secret());
        self.inner
            .http
            .request(method, url)
            .header("apikey", anon)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    fn table_headers(query: &Query, prefer_representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut prefer = Vec::new();
        if query.wants_count() {
            prefer.push("count=exact");
        }
        if prefer_representation {
            prefer.push("return=representation");
        }
        if !prefer.is_empty()
            && let Ok(value) = HeaderValue::from_str(&prefer.join(","))
        {
            headers.insert("Prefer", value);
        }
        if query.wants_single() {
            headers.insert(
                "Accept",
                HeaderValue::from_static("application/vnd.pgrst.object+json"),
            );
        }
        headers
    }

    // =========================================================================
    // Table operations
    // =========================================================================

    /// Fetch rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport, API or decoding failures.
    #[instrument(skip(self, query), fields(table = %table))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, SupabaseError> {
        let response = self
            .data_request(Method::GET, &self.rest_url(table, query))
            .headers(Self::table_headers(query, false))
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Fetch every matching row, `batch` rows per request.
    ///
    /// The server caps unranged reads at its `max-rows` setting, so walks
    /// over whole tables go through here. `query` must carry a stable order.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if any batch fails.
    #[instrument(skip(self, query), fields(table = %table))]
    pub async fn select_all<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        batch: u64,
    ) -> Result<Vec<T>, SupabaseError> {
        let batch = batch.max(1);
        let mut rows = Vec::new();
        let mut from = 0;
        loop {
            let page: Vec<T> = self
                .select(table, &query.clone().range(from, from + batch - 1))
                .await?;
            let fetched = page.len() as u64;
            rows.extend(page);
            if fetched < batch {
                return Ok(rows);
            }
            from += batch;
        }
    }

    /// Fetch rows plus the exact total from `Content-Range`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport, API or decoding failures.
    #[instrument(skip(self, query), fields(table = %table))]
    pub async fn select_with_count<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<(Vec<T>, u64), SupabaseError> {
        let query = query.clone().count_exact();
        let response = self
            .data_request(Method::GET, &self.rest_url(table, &query))
            .headers(Self::table_headers(&query, false))
            .send()
            .await?;
        let response = check(response).await?;
        let total = content_range_total(&response);
        let rows: Vec<T> = decode(response).await?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok((rows, total))
    }

    /// Count rows matching `query` without transferring them.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failures, or
    /// `SupabaseError::Parse` when the count header is missing.
    #[instrument(skip(self, query), fields(table = %table))]
    pub async fn count(&self, table: &str, query: &Query) -> Result<u64, SupabaseError> {
        let query = query.clone().count_exact().head();
        let response = self
            .data_request(Method::HEAD, &self.rest_url(table, &query))
            .headers(Self::table_headers(&query, false))
            .send()
            .await?;
        let response = check(response).await?;
        content_range_total(&response)
            .ok_or_else(|| SupabaseError::Parse("missing Content-Range total".to_string()))
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// Returns an error for which [`SupabaseError::is_no_rows`] holds when
    /// nothing matched.
    #[instrument(skip(self, query), fields(table = %table))]
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<T, SupabaseError> {
        let query = query.clone().single();
        let response = self
            .data_request(Method::GET, &self.rest_url(table, &query))
            .headers(Self::table_headers(&query, false))
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Fetch one row, mapping "no rows" to `None`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` for any failure other than an empty result.
    pub async fn maybe_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Option<T>, SupabaseError> {
        match self.select_single(table, query).await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_no_rows() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert one row and return the stored representation.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport, API or decoding failures.
    #[instrument(skip(self, row), fields(table = %table))]
    pub async fn insert<T, B>(&self, table: &str, row: &B) -> Result<Vec<T>, SupabaseError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .data_request(Method::POST, &self.rest_url(table, &Query::new()))
            .headers(Self::table_headers(&Query::new(), true))
            .json(row)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Update rows matching `filter`; returns the updated rows.
    ///
    /// An empty vector means nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport, API or decoding failures.
    #[instrument(skip(self, filter, changes), fields(table = %table))]
    pub async fn update<T, B>(
        &self,
        table: &str,
        filter: &Query,
        changes: &B,
    ) -> Result<Vec<T>, SupabaseError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.filter_url(table, filter);
        let response = self
            .data_request(Method::PATCH, &url)
            .headers(Self::table_headers(&Query::new(), true))
            .json(changes)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Delete rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failures.
    #[instrument(skip(self, filter), fields(table = %table))]
    pub async fn delete(&self, table: &str, filter: &Query) -> Result<(), SupabaseError> {
        let url = self.filter_url(table, filter);
        let response = self.data_request(Method::DELETE, &url).send().await?;
        check(response).await?;
        Ok(())
    }

    fn filter_url(&self, table: &str, filter: &Query) -> String {
        let qs = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(filter.filter_params())
            .finish();
        format!("{}/rest/v1/{table}?{qs}", self.inner.base_url)
    }

    /// Check that the auth service answers.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the health endpoint is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), SupabaseError> {
        let response = self
            .auth_request(Method::GET, &self.auth_url("health"), None)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

// =============================================================================
// Response handling
// =============================================================================

fn content_range_total(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
}

/// Turn a non-success response into a `SupabaseError`.
pub(super) async fn check(response: Response) -> Result<Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let code = body.error_code.clone().or_else(|| {
        body.code.as_ref().map(|c| match c {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    });
    let message = body
        .message
        .or(body.msg)
        .or(body.error_description)
        .or(body.error)
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                text.clone()
            }
        });

    if status == StatusCode::UNAUTHORIZED {
        tracing::debug!(%message, "backend rejected credentials");
        return Err(SupabaseError::Unauthorized);
    }

    Err(SupabaseError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

/// Decode a JSON body, reporting the serde error message on failure.
pub(super) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SupabaseError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SupabaseError::Parse(e.to_string()))
}
