//! Advertisements, their display formats and the edit form.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use tigube_core::{AdFormatId, AdType, AdvertisementId, UserId};

/// Pet types offered for targeting.
pub const PET_TYPES: [&str; 7] = [
    "Hund",
    "Katze",
    "Vogel",
    "Kaninchen",
    "Fisch",
    "Kleintier",
    "Andere",
];

/// Subscription types offered for targeting.
pub const SUBSCRIPTION_TARGETS: [&str; 2] = ["free", "premium"];

/// Storage bucket for uploaded creatives.
pub const IMAGE_BUCKET: &str = "advertisement-images";

/// Upper bound for uploaded creatives.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An advertisement row, optionally joined with its format
/// (`advertisements_with_formats`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: AdvertisementId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub ad_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_pet_types: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_locations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_subscription_types: Vec<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub max_impressions: Option<i64>,
    #[serde(default)]
    pub current_impressions: Option<i64>,
    #[serde(default)]
    pub max_clicks: Option<i64>,
    #[serde(default)]
    pub current_clicks: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub format_id: Option<AdFormatId>,
    #[serde(default)]
    pub custom_width: Option<i32>,
    #[serde(default)]
    pub custom_height: Option<i32>,

    // View-only columns
    #[serde(default, skip_serializing)]
    pub format_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub format_description: Option<String>,
    #[serde(default, skip_serializing)]
    pub display_width: Option<i32>,
    #[serde(default, skip_serializing)]
    pub display_height: Option<i32>,
    #[serde(default, skip_serializing)]
    pub placement: Option<String>,
    #[serde(default, skip_serializing)]
    pub function_description: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lifecycle badge of an advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdStatus {
    Inactive,
    Scheduled,
    Expired,
    Active,
}

impl AdStatus {
    /// Badge text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inactive => "Inaktiv",
            Self::Scheduled => "Geplant",
            Self::Expired => "Abgelaufen",
            Self::Active => "Aktiv",
        }
    }

    /// CSS modifier for the badge.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Inactive => "badge-gray",
            Self::Scheduled => "badge-yellow",
            Self::Expired => "badge-red",
            Self::Active => "badge-green",
        }
    }
}

impl Advertisement {
    /// Status at `now`: the active flag first, then the schedule window.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> AdStatus {
        if !self.is_active {
            return AdStatus::Inactive;
        }
        if self.start_date.is_some_and(|start| now < start) {
            return AdStatus::Scheduled;
        }
        if self.end_date.is_some_and(|end| now > end) {
            return AdStatus::Expired;
        }
        AdStatus::Active
    }

    /// Title for display.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Ohne Titel")
    }

    /// German label of the ad type.
    #[must_use]
    pub fn ad_type_label(&self) -> String {
        self.ad_type
            .as_deref()
            .map_or_else(String::new, AdType::label_for)
    }

    /// Case-insensitive match on title or description.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.title, &self.description]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Active flag filter of the advertisement table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl AdFilter {
    /// Every filter, in menu order.
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Inactive];

    /// German menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "Alle",
            Self::Active => "Aktiv",
            Self::Inactive => "Inaktiv",
        }
    }

    /// Parse a query parameter; unknown values select everything.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("active") => Self::Active,
            Some("inactive") => Self::Inactive,
            _ => Self::All,
        }
    }

    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Whether `ad` passes this filter.
    #[must_use]
    pub const fn matches(self, ad: &Advertisement) -> bool {
        match self {
            Self::All => true,
            Self::Active => ad.is_active,
            Self::Inactive => !ad.is_active,
        }
    }
}

/// Apply search and filter to a loaded page of advertisements.
#[must_use]
pub fn filter_advertisements(
    ads: Vec<Advertisement>,
    filter: AdFilter,
    search: &str,
) -> Vec<Advertisement> {
    ads.into_iter()
        .filter(|ad| filter.matches(ad) && ad.matches_search(search))
        .collect()
}

/// A display format creatives are produced for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdFormat {
    pub id: AdFormatId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    pub ad_type: String,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub function_description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

// =============================================================================
// Form
// =============================================================================

/// Writable columns of `advertisements`, as submitted by the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvertisementDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub cta_text: Option<String>,
    pub ad_type: Option<String>,
    pub format_id: Option<AdFormatId>,
    pub target_pet_types: Vec<String>,
    pub target_locations: Vec<String>,
    pub target_subscription_types: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub priority: i32,
    pub max_impressions: Option<i64>,
    pub max_clicks: Option<i64>,
    pub custom_width: Option<i32>,
    pub custom_height: Option<i32>,
}

/// Validation failures of the advertisement form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Bitte wählen Sie ein Anzeigeformat aus.")]
    MissingFormat,
    #[error("Ungültiger Wert für {0}")]
    InvalidField(&'static str),
    #[error("Das Enddatum liegt vor dem Startdatum.")]
    EndBeforeStart,
}

impl AdvertisementDraft {
    /// Defaults of a new advertisement.
    #[must_use]
    pub fn new_defaults() -> Self {
        Self {
            cta_text: Some("Mehr erfahren".to_string()),
            target_subscription_types: vec!["free".to_string()],
            is_active: true,
            ..Self::default()
        }
    }

    /// Prefill the form from an existing advertisement.
    ///
    /// Missing dimensions are taken from the selected format.
    #[must_use]
    pub fn from_existing(ad: &Advertisement, formats: &[AdFormat]) -> Self {
        let format = ad
            .format_id
            .and_then(|id| formats.iter().find(|f| f.id == id));
        let (custom_width, custom_height) = match (ad.custom_width, ad.custom_height, format) {
            (Some(w), Some(h), _) => (Some(w), Some(h)),
            (_, _, Some(f)) => (f.width, f.height),
            (w, h, None) => (w, h),
        };
        let target_subscription_types = if ad.target_subscription_types.is_empty() {
            vec!["free".to_string()]
        } else {
            ad.target_subscription_types.clone()
        };

        Self {
            title: ad.title.clone(),
            description: ad.description.clone(),
            image_url: ad.image_url.clone(),
            link_url: ad.link_url.clone(),
            cta_text: ad.cta_text.clone(),
            ad_type: ad.ad_type.clone(),
            format_id: ad.format_id,
            target_pet_types: ad.target_pet_types.clone(),
            target_locations: ad.target_locations.clone(),
            target_subscription_types,
            start_date: ad.start_date,
            end_date: ad.end_date,
            is_active: ad.is_active,
            priority: ad.priority,
            max_impressions: ad.max_impressions,
            max_clicks: ad.max_clicks,
            custom_width,
            custom_height,
        }
    }

    /// Parse urlencoded form pairs.
    ///
    /// Repeated keys (`target_pet_types`, `target_subscription_types`)
    /// accumulate; `target_locations` is a comma separated list. An empty
    /// subscription selection falls back to `free`.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] when no format is selected or a number or
    /// date does not parse.
    pub fn from_form<'a, I>(pairs: I) -> Result<Self, DraftError>
    where
        I: IntoIterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    {
        let mut draft = Self {
            is_active: false,
            ..Self::default()
        };

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_ref() {
                "title" => draft.title = non_empty(value),
                "description" => draft.description = non_empty(value),
                "image_url" => draft.image_url = non_empty(value),
                "link_url" => draft.link_url = non_empty(value),
                "cta_text" => draft.cta_text = non_empty(value),
                "format_id" => {
                    draft.format_id = match non_empty(value) {
                        Some(v) => Some(
                            v.parse()
                                .map_err(|_| DraftError::InvalidField("Anzeigeformat"))?,
                        ),
                        None => None,
                    };
                }
                "target_pet_types" if !value.is_empty() => {
                    draft.target_pet_types.push(value.to_string());
                }
                "target_subscription_types" if !value.is_empty() => {
                    draft.target_subscription_types.push(value.to_string());
                }
                "target_locations" => {
                    draft.target_locations = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                }
                "start_date" => draft.start_date = parse_datetime(value, "Startdatum")?,
                "end_date" => draft.end_date = parse_datetime(value, "Enddatum")?,
                "is_active" => draft.is_active = matches!(value, "on" | "true" | "1"),
                "priority" => {
                    draft.priority = parse_number(value, "Priorität")?.unwrap_or(0);
                }
                "max_impressions" => draft.max_impressions = parse_number(value, "Max. Impressionen")?,
                "max_clicks" => draft.max_clicks = parse_number(value, "Max. Klicks")?,
                "custom_width" => draft.custom_width = parse_number(value, "Breite")?,
                "custom_height" => draft.custom_height = parse_number(value, "Höhe")?,
                _ => {}
            }
        }

        if draft.target_subscription_types.is_empty() {
            draft.target_subscription_types.push("free".to_string());
        }
        if draft.format_id.is_none() {
            return Err(DraftError::MissingFormat);
        }
        if let (Some(start), Some(end)) = (draft.start_date, draft.end_date)
            && end < start
        {
            return Err(DraftError::EndBeforeStart);
        }

        Ok(draft)
    }

    /// `start_date` formatted for a `datetime-local` input.
    #[must_use]
    pub fn start_input(&self) -> String {
        datetime_input(self.start_date)
    }

    /// `end_date` formatted for a `datetime-local` input.
    #[must_use]
    pub fn end_input(&self) -> String {
        datetime_input(self.end_date)
    }

    /// Locations as a comma separated list.
    #[must_use]
    pub fn locations_input(&self) -> String {
        self.target_locations.join(", ")
    }

    /// Whether `pet_type` is targeted.
    #[must_use]
    pub fn targets_pet(&self, pet_type: &str) -> bool {
        self.target_pet_types.iter().any(|t| t == pet_type)
    }

    /// Whether `subscription` is targeted.
    #[must_use]
    pub fn targets_subscription(&self, subscription: &str) -> bool {
        self.target_subscription_types.iter().any(|t| t == subscription)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_number<T: std::str::FromStr>(
    value: &str,
    field: &'static str,
) -> Result<Option<T>, DraftError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| DraftError::InvalidField(field))
}

/// Accepts RFC 3339 and the `YYYY-MM-DDTHH:MM` of `datetime-local` inputs (UTC).
fn parse_datetime(value: &str, field: &'static str) -> Result<Option<DateTime<Utc>>, DraftError> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .map_err(|_| DraftError::InvalidField(field))
}

fn datetime_input(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(String::new, |dt| dt.format("%Y-%m-%dT%H:%M").to_string())
}

/// Insert payload for a new advertisement.
#[derive(Debug, Serialize)]
pub struct NewAdvertisement<'a> {
    #[serde(flatten)]
    pub draft: &'a AdvertisementDraft,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Update payload for an existing advertisement.
#[derive(Debug, Serialize)]
pub struct AdvertisementChanges<'a> {
    #[serde(flatten)]
    pub draft: &'a AdvertisementDraft,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a copy of an existing advertisement.
///
/// Identity, timestamps and counters of the source are not carried over.
#[derive(Debug, Serialize)]
pub struct DuplicatedAdvertisement {
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub cta_text: Option<String>,
    pub ad_type: Option<String>,
    pub target_pet_types: Vec<String>,
    pub target_locations: Vec<String>,
    pub target_subscription_types: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub priority: i32,
    pub max_impressions: Option<i64>,
    pub current_impressions: i64,
    pub max_clicks: Option<i64>,
    pub current_clicks: i64,
    pub format_id: Option<AdFormatId>,
    pub custom_width: Option<i32>,
    pub custom_height: Option<i32>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DuplicatedAdvertisement {
    /// Copy `source` as an inactive ad with fresh counters.
    #[must_use]
    pub fn from_source(source: Advertisement, created_by: Option<UserId>, now: DateTime<Utc>) -> Self {
        let title = format!(
            "{} (Kopie)",
            source
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or("Neue Werbung")
        );
        Self {
            title,
            description: source.description,
            image_url: source.image_url,
            link_url: source.link_url,
            cta_text: source.cta_text,
            ad_type: source.ad_type,
            target_pet_types: source.target_pet_types,
            target_locations: source.target_locations,
            target_subscription_types: source.target_subscription_types,
            start_date: source.start_date,
            end_date: source.end_date,
            is_active: false,
            priority: source.priority,
            max_impressions: source.max_impressions,
            current_impressions: 0,
            max_clicks: source.max_clicks,
            current_clicks: 0,
            format_id: source.format_id,
            custom_width: source.custom_width,
            custom_height: source.custom_height,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Object path for an uploaded creative: `ads/{millis}_{suffix}.{ext}`.
#[must_use]
pub fn image_object_path(file_name: &str, millis: i64, suffix: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("ads/{millis}_{suffix}.{ext}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::borrow::Cow;

    fn ad(value: serde_json::Value) -> Advertisement {
        let mut base = json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "title": "Sommeraktion",
            "description": "Futter zum halben Preis",
            "ad_type": "search_card",
            "is_active": true,
            "priority": 3
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), value.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn pairs(items: &[(&'static str, &'static str)]) -> Vec<(Cow<'static, str>, Cow<'static, str>)> {
        items
            .iter()
            .map(|(k, v)| (Cow::Borrowed(*k), Cow::Borrowed(*v)))
            .collect()
    }

    #[test]
    fn test_status_badge() {
        let now = Utc::now();
        assert_eq!(ad(json!({ "is_active": false })).status_at(now), AdStatus::Inactive);
        assert_eq!(ad(json!({})).status_at(now), AdStatus::Active);

        let future = (now + Duration::days(2)).to_rfc3339();
        assert_eq!(ad(json!({ "start_date": future })).status_at(now), AdStatus::Scheduled);

        let past = (now - Duration::days(2)).to_rfc3339();
        assert_eq!(ad(json!({ "end_date": past })).status_at(now), AdStatus::Expired);
        assert_eq!(AdStatus::Expired.label(), "Abgelaufen");
    }

    #[test]
    fn test_null_arrays_become_empty() {
        let a = ad(json!({ "target_pet_types": null, "target_locations": ["Berlin"] }));
        assert!(a.target_pet_types.is_empty());
        assert_eq!(a.target_locations, vec!["Berlin"]);
    }

    #[test]
    fn test_search_and_filter() {
        let ads = vec![
            ad(json!({})),
            ad(json!({ "id": "11111111-10b1-426f-9247-bb680e5fe0c8", "title": "Hundeschule", "is_active": false })),
        ];
        assert_eq!(filter_advertisements(ads.clone(), AdFilter::Active, "").len(), 1);
        assert_eq!(filter_advertisements(ads.clone(), AdFilter::Inactive, "").len(), 1);
        assert_eq!(filter_advertisements(ads.clone(), AdFilter::All, "HALBEN").len(), 1);
        assert_eq!(filter_advertisements(ads, AdFilter::All, "").len(), 2);
    }

    #[test]
    fn test_form_requires_format() {
        let err = AdvertisementDraft::from_form(pairs(&[("title", "Test")])).unwrap_err();
        assert_eq!(err, DraftError::MissingFormat);
    }

    #[test]
    fn test_form_parses_fields() {
        let draft = AdvertisementDraft::from_form(pairs(&[
            ("title", " Sommer "),
            ("format_id", "67e55044-10b1-426f-9247-bb680e5fe0c8"),
            ("target_pet_types", "Hund"),
            ("target_pet_types", "Katze"),
            ("target_locations", "Berlin, Hamburg,,"),
            ("start_date", "2025-06-01T08:30"),
            ("priority", "5"),
            ("max_clicks", ""),
            ("is_active", "on"),
        ]))
        .unwrap();

        assert_eq!(draft.title.as_deref(), Some("Sommer"));
        assert_eq!(draft.target_pet_types, vec!["Hund", "Katze"]);
        assert_eq!(draft.target_locations, vec!["Berlin", "Hamburg"]);
        assert_eq!(draft.target_subscription_types, vec!["free"]);
        assert_eq!(draft.priority, 5);
        assert_eq!(draft.max_clicks, None);
        assert!(draft.is_active);
        assert_eq!(draft.start_input(), "2025-06-01T08:30");
    }

    #[test]
    fn test_form_rejects_bad_numbers_and_ranges() {
        let err = AdvertisementDraft::from_form(pairs(&[
            ("format_id", "67e55044-10b1-426f-9247-bb680e5fe0c8"),
            ("priority", "hoch"),
        ]))
        .unwrap_err();
        assert_eq!(err, DraftError::InvalidField("Priorität"));

        let err = AdvertisementDraft::from_form(pairs(&[
            ("format_id", "67e55044-10b1-426f-9247-bb680e5fe0c8"),
            ("start_date", "2025-06-02T00:00"),
            ("end_date", "2025-06-01T00:00"),
        ]))
        .unwrap_err();
        assert_eq!(err, DraftError::EndBeforeStart);
    }

    #[test]
    fn test_prefill_takes_dimensions_from_format() {
        let format: AdFormat = serde_json::from_value(json!({
            "id": "22222222-10b1-426f-9247-bb680e5fe0c8",
            "name": "Suchkarte",
            "width": 300,
            "height": 250,
            "ad_type": "search_card",
            "is_active": true
        }))
        .unwrap();
        let a = ad(json!({ "format_id": "22222222-10b1-426f-9247-bb680e5fe0c8" }));
        let draft = AdvertisementDraft::from_existing(&a, &[format]);
        assert_eq!(draft.custom_width, Some(300));
        assert_eq!(draft.custom_height, Some(250));
        assert_eq!(draft.target_subscription_types, vec!["free"]);
    }

    #[test]
    fn test_duplicate_resets_counters() {
        let source = ad(json!({ "current_clicks": 40, "current_impressions": 900 }));
        let admin = UserId::random();
        let copy = DuplicatedAdvertisement::from_source(source, Some(admin), Utc::now());
        assert_eq!(copy.title, "Sommeraktion (Kopie)");
        assert!(!copy.is_active);
        assert_eq!(copy.current_clicks, 0);
        assert_eq!(copy.current_impressions, 0);
        assert_eq!(copy.created_by, Some(admin));

        let untitled = DuplicatedAdvertisement::from_source(ad(json!({ "title": null })), None, Utc::now());
        assert_eq!(untitled.title, "Neue Werbung (Kopie)");
    }

    #[test]
    fn test_image_object_path() {
        assert_eq!(image_object_path("Banner.PNG", 1_700_000_000_000, "abc1234"), "ads/1700000000000_abc1234.png");
        assert_eq!(image_object_path("noext", 1, "x"), "ads/1_x.bin");
    }
}
