//! Advertisement repository.
//!
//! Lists read the `advertisements_with_formats` view; writes go to the
//! `advertisements` table. Creatives are uploaded to object storage.

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use tracing::instrument;

use tigube_core::{AdFormatId, AdvertisementId, UserId};

use super::{Page, RepositoryError, page_range};
use crate::models::advertisement::{
    AdFormat, Advertisement, AdvertisementChanges, AdvertisementDraft, DuplicatedAdvertisement,
    IMAGE_BUCKET, MAX_IMAGE_BYTES, NewAdvertisement, image_object_path,
};
use crate::supabase::{Query, SupabaseClient};

const TABLE: &str = "advertisements";
const VIEW: &str = "advertisements_with_formats";
const FORMATS: &str = "advertisement_formats";

/// An uploaded creative, as received from the browser.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check type and size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` with a German message for
    /// non-image files and files above 5 MB.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if !self.content_type.starts_with("image/") {
            return Err(RepositoryError::Validation(
                "Bitte wählen Sie eine Bilddatei aus".to_string(),
            ));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(RepositoryError::Validation(
                "Die Datei ist zu groß (max. 5MB)".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(RepositoryError::Validation("Die Datei ist leer".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct FormatType {
    ad_type: String,
}

/// Seven lowercase alphanumerics for object names.
fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(7)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Repository for advertisements and their formats.
pub struct AdvertisementRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AdvertisementRepository<'a> {
    /// Create a new advertisement repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// One page of advertisements with format details, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page<Advertisement>, RepositoryError> {
        let (from, to) = page_range(page, per_page);
        let query = Query::select("*").order("created_at", false).range(from, to);
        let (rows, total) = self.client.select_with_count(VIEW, &query).await?;
        Ok(Page { rows, total })
    }

    /// Active display formats, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn formats(&self) -> Result<Vec<AdFormat>, RepositoryError> {
        let query = Query::select("*")
            .eq("is_active", true)
            .order("name", true);
        Ok(self.client.select(FORMATS, &query).await?)
    }

    /// A single advertisement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no advertisement has this ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: AdvertisementId) -> Result<Advertisement, RepositoryError> {
        self.client
            .select_single(TABLE, &Query::select("*").eq("id", id))
            .await
            .map_err(RepositoryError::from_single)
    }

    /// Create an advertisement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the format lookup or insert fails.
    #[instrument(skip(self, draft))]
    pub async fn create(
        &self,
        draft: &AdvertisementDraft,
        created_by: Option<UserId>,
    ) -> Result<Advertisement, RepositoryError> {
        let draft = self.with_format_type(draft).await?;
        let now = Utc::now();
        let row = NewAdvertisement {
            draft: &draft,
            created_by,
            created_at: now,
            updated_at: now,
        };
        let inserted: Vec<Advertisement> = self.client.insert(TABLE, &row).await?;
        let ad = first_row(inserted)?;
        tracing::info!(ad_id = %ad.id, "Advertisement created");
        Ok(ad)
    }

    /// Update an advertisement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no advertisement has this ID.
    #[instrument(skip(self, draft))]
    pub async fn update(
        &self,
        id: AdvertisementId,
        draft: &AdvertisementDraft,
    ) -> Result<Advertisement, RepositoryError> {
        let draft = self.with_format_type(draft).await?;
        let changes = AdvertisementChanges {
            draft: &draft,
            updated_at: Utc::now(),
        };
        let updated: Vec<Advertisement> = self
            .client
            .update(TABLE, &Query::new().eq("id", id), &changes)
            .await?;
        first_row(updated)
    }

    /// Delete an advertisement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AdvertisementId) -> Result<(), RepositoryError> {
        self.client.delete(TABLE, &Query::new().eq("id", id)).await?;
        tracing::info!(ad_id = %id, "Advertisement deleted");
        Ok(())
    }

    /// Copy an advertisement as an inactive draft with reset counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the source does not exist.
    #[instrument(skip(self))]
    pub async fn duplicate(
        &self,
        id: AdvertisementId,
        created_by: Option<UserId>,
    ) -> Result<Advertisement, RepositoryError> {
        let source = self.get(id).await?;
        let copy = DuplicatedAdvertisement::from_source(source, created_by, Utc::now());
        let inserted: Vec<Advertisement> = self.client.insert(TABLE, &copy).await?;
        let ad = first_row(inserted)?;
        tracing::info!(source_id = %id, ad_id = %ad.id, "Advertisement duplicated");
        Ok(ad)
    }

    /// Upload a creative and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for rejected files and
    /// `RepositoryError::Backend` if the upload fails.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, RepositoryError> {
        upload.validate()?;
        let path = image_object_path(
            &upload.file_name,
            Utc::now().timestamp_millis(),
            &random_suffix(),
        );
        let path = self
            .client
            .upload(IMAGE_BUCKET, &path, upload.bytes, &upload.content_type)
            .await?;
        Ok(self.client.public_url(IMAGE_BUCKET, &path))
    }

    /// Copy the ad type of the selected format into the draft.
    async fn with_format_type(
        &self,
        draft: &AdvertisementDraft,
    ) -> Result<AdvertisementDraft, RepositoryError> {
        let mut draft = draft.clone();
        if let Some(format_id) = draft.format_id {
            draft.ad_type = Some(self.format_type(format_id).await?);
        }
        Ok(draft)
    }

    async fn format_type(&self, id: AdFormatId) -> Result<String, RepositoryError> {
        let row: FormatType = self
            .client
            .select_single(FORMATS, &Query::select("ad_type").eq("id", id))
            .await
            .map_err(RepositoryError::from_single)?;
        Ok(row.ad_type)
    }
}

fn first_row<T>(rows: Vec<T>) -> Result<T, RepositoryError> {
    rows.into_iter().next().ok_or(RepositoryError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn upload(content_type: &str, size: usize) -> ImageUpload {
        ImageUpload {
            file_name: "banner.png".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn test_upload_validation() {
        assert!(upload("image/png", 1024).validate().is_ok());
        assert!(matches!(
            upload("application/pdf", 1024).validate(),
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            upload("image/jpeg", MAX_IMAGE_BYTES + 1).validate(),
            Err(RepositoryError::Validation(_))
        ));
        assert!(upload("image/jpeg", MAX_IMAGE_BYTES).validate().is_ok());
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_first_row() {
        assert!(matches!(first_row::<Value>(vec![]), Err(RepositoryError::NotFound)));
    }
}
