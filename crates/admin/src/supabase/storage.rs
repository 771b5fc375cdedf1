//! Storage bucket uploads.

use reqwest::Method;
use tracing::instrument;

use super::client::check;
use super::{SupabaseClient, SupabaseError};

/// Cache lifetime for uploaded objects, in seconds.
const CACHE_CONTROL_SECS: u32 = 3600;

impl SupabaseClient {
    /// Upload an object. Existing objects are never overwritten.
    ///
    /// Returns the object path within the bucket.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` (409) if the path already exists, other
    /// variants for transport or service failures.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        let url = self.storage_url(&format!("object/{bucket}/{path}"));
        let response = self
            .data_request(Method::POST, &url)
            .header("Content-Type", content_type)
            .header("cache-control", format!("max-age={CACHE_CONTROL_SECS}"))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(path.to_string())
    }

    /// Public URL of an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{bucket}/{path}"))
    }
}
