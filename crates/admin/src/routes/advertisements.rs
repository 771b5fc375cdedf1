//! Advertisement management route handlers.
//!
//! The edit form carries repeated keys (`target_pet_types`,
//! `target_subscription_types`), so create and update read the raw body
//! instead of `Form<T>`.

use askama::Template;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, RawForm, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use tigube_core::AdvertisementId;

use crate::components::{DataTableConfig, Pagination, advertisements_table_config};
use crate::db::{AdvertisementRepository, ImageUpload, RepositoryError};
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::advertisement::{
    MAX_IMAGE_BYTES, PET_TYPES, SUBSCRIPTION_TARGETS, filter_advertisements,
};
use crate::models::{
    AdFilter, AdFormat, AdStatus, Advertisement, AdvertisementDraft, CurrentAdmin, Flash,
};
use crate::routes::{AdminUserView, redirect_with, render};
use crate::state::AppState;

/// Rows loaded per page.
pub const ADS_PER_PAGE: u64 = 20;

/// Request body limit of the upload endpoint (image plus multipart overhead).
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Build the advertisements router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/advertisements", get(index).post(create))
        .route("/advertisements/new", get(new_ad))
        .route("/advertisements/{id}", get(edit).post(update))
        .route("/advertisements/{id}/delete", post(delete))
        .route("/advertisements/{id}/duplicate", post(duplicate))
        .route(
            "/api/advertisements/images",
            post(upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

// =============================================================================
// Templates
// =============================================================================

/// Advertisement list template.
#[derive(Template)]
#[template(path = "advertisements/index.html")]
pub struct AdvertisementsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub table: DataTableConfig,
    pub rows: Vec<AdRow>,
    pub pagination: Pagination,
    pub search: String,
    pub filter: AdFilter,
    pub filter_options: Vec<AdFilter>,
    pub load_error: bool,
}

/// A table row: the advertisement and its schedule status.
pub struct AdRow {
    pub ad: Advertisement,
    pub status: AdStatus,
}

impl AdRow {
    fn at(ad: Advertisement, now: DateTime<Utc>) -> Self {
        let status = ad.status_at(now);
        Self { ad, status }
    }
}

/// Advertisement editor template, shared by create and edit.
#[derive(Template)]
#[template(path = "advertisements/form.html")]
pub struct AdvertisementFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub draft: AdvertisementDraft,
    pub formats: Vec<AdFormat>,
    pub action: String,
    pub ad_id: Option<AdvertisementId>,
    pub pet_types: Vec<&'static str>,
    pub subscription_targets: Vec<&'static str>,
}

impl AdvertisementFormTemplate {
    fn new(
        admin: &CurrentAdmin,
        flash: Option<Flash>,
        draft: AdvertisementDraft,
        formats: Vec<AdFormat>,
        ad_id: Option<AdvertisementId>,
    ) -> Self {
        let action = ad_id.map_or_else(
            || "/advertisements".to_string(),
            |id| format!("/advertisements/{id}"),
        );
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/advertisements".to_string(),
            flash,
            draft,
            formats,
            action,
            ad_id,
            pet_types: PET_TYPES.to_vec(),
            subscription_targets: SUBSCRIPTION_TARGETS.to_vec(),
        }
    }

    /// Whether `format` is the selected one.
    pub fn is_selected(&self, format: &AdFormat) -> bool {
        self.draft.format_id == Some(format.id)
    }
}

/// Query parameters of the advertisement table.
#[derive(Debug, Default, Deserialize)]
pub struct AdvertisementsQuery {
    pub page: Option<u64>,
    pub q: Option<String>,
    pub active: Option<String>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Advertisement list handler.
///
/// GET /advertisements
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdvertisementsQuery>,
) -> Html<String> {
    let page = query.page.unwrap_or(1).max(1);
    let search = query.q.unwrap_or_default().trim().to_string();
    let filter = AdFilter::from_param(query.active.as_deref());

    let (rows, total, load_error) = match AdvertisementRepository::new(state.supabase())
        .list(page, ADS_PER_PAGE)
        .await
    {
        Ok(result) => {
            let now = Utc::now();
            let rows = filter_advertisements(result.rows, filter, &search)
                .into_iter()
                .map(|ad| AdRow::at(ad, now))
                .collect();
            (rows, result.total, false)
        }
        Err(e) => {
            tracing::error!("Failed to fetch advertisements: {e}");
            (vec![], 0, true)
        }
    };

    render(&AdvertisementsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/advertisements".to_string(),
        flash: take_flash(&session).await,
        table: advertisements_table_config(),
        rows,
        pagination: Pagination::new(page, ADS_PER_PAGE, total),
        search,
        filter,
        filter_options: AdFilter::ALL.to_vec(),
        load_error,
    })
}

/// Editor for a new advertisement.
///
/// GET /advertisements/new
#[instrument(skip(admin, state, session))]
pub async fn new_ad(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let formats = load_formats(&state).await;
    render(&AdvertisementFormTemplate::new(
        &admin,
        take_flash(&session).await,
        AdvertisementDraft::new_defaults(),
        formats,
        None,
    ))
}

/// Create an advertisement.
///
/// POST /advertisements
#[instrument(skip(admin, state, session, body))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    RawForm(body): RawForm,
) -> Redirect {
    let draft = match AdvertisementDraft::from_form(url::form_urlencoded::parse(&body)) {
        Ok(draft) => draft,
        Err(e) => {
            return redirect_with(&session, "/advertisements/new", Flash::error(e.to_string()))
                .await;
        }
    };

    match AdvertisementRepository::new(state.supabase())
        .create(&draft, Some(admin.id))
        .await
    {
        Ok(_) => {
            redirect_with(
                &session,
                "/advertisements",
                Flash::success("Werbung erfolgreich erstellt"),
            )
            .await
        }
        Err(e) => {
            tracing::error!("Failed to create advertisement: {e}");
            redirect_with(
                &session,
                "/advertisements/new",
                Flash::error("Fehler beim Speichern der Werbung"),
            )
            .await
        }
    }
}

/// Editor for an existing advertisement.
///
/// GET /advertisements/{id}
#[instrument(skip(admin, state, session))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdvertisementId>,
) -> Response {
    let repo = AdvertisementRepository::new(state.supabase());
    let (ad, formats) = tokio::join!(repo.get(id), load_formats(&state));

    match ad {
        Ok(ad) => {
            let draft = AdvertisementDraft::from_existing(&ad, &formats);
            render(&AdvertisementFormTemplate::new(
                &admin,
                take_flash(&session).await,
                draft,
                formats,
                Some(id),
            ))
            .into_response()
        }
        Err(e) => {
            if !matches!(e, RepositoryError::NotFound) {
                tracing::error!(ad_id = %id, "Failed to fetch advertisement: {e}");
            }
            redirect_with(
                &session,
                "/advertisements",
                Flash::error("Werbung nicht gefunden."),
            )
            .await
            .into_response()
        }
    }
}

/// Save an existing advertisement.
///
/// POST /advertisements/{id}
#[instrument(skip(_admin, state, session, body))]
pub async fn update(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdvertisementId>,
    RawForm(body): RawForm,
) -> Redirect {
    let back = format!("/advertisements/{id}");
    let draft = match AdvertisementDraft::from_form(url::form_urlencoded::parse(&body)) {
        Ok(draft) => draft,
        Err(e) => return redirect_with(&session, &back, Flash::error(e.to_string())).await,
    };

    match AdvertisementRepository::new(state.supabase())
        .update(id, &draft)
        .await
    {
        Ok(_) => {
            redirect_with(
                &session,
                "/advertisements",
                Flash::success("Werbung erfolgreich aktualisiert"),
            )
            .await
        }
        Err(e) => {
            tracing::error!(ad_id = %id, "Failed to update advertisement: {e}");
            redirect_with(
                &session,
                &back,
                Flash::error("Fehler beim Speichern der Werbung"),
            )
            .await
        }
    }
}

/// Delete an advertisement.
///
/// POST /advertisements/{id}/delete
#[instrument(skip(_admin, state, session))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdvertisementId>,
) -> Redirect {
    let flash = match AdvertisementRepository::new(state.supabase()).delete(id).await {
        Ok(()) => Flash::success("Werbung erfolgreich gelöscht"),
        Err(e) => {
            tracing::error!(ad_id = %id, "Failed to delete advertisement: {e}");
            Flash::error("Fehler beim Löschen der Werbung")
        }
    };
    redirect_with(&session, "/advertisements", flash).await
}

/// Copy an advertisement as an inactive draft.
///
/// POST /advertisements/{id}/duplicate
#[instrument(skip(admin, state, session))]
pub async fn duplicate(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdvertisementId>,
) -> Redirect {
    match AdvertisementRepository::new(state.supabase())
        .duplicate(id, Some(admin.id))
        .await
    {
        Ok(copy) => {
            redirect_with(
                &session,
                &format!("/advertisements/{}", copy.id),
                Flash::success("Werbung erfolgreich dupliziert"),
            )
            .await
        }
        Err(e) => {
            tracing::error!(ad_id = %id, "Failed to duplicate advertisement: {e}");
            redirect_with(
                &session,
                "/advertisements",
                Flash::error("Fehler beim Duplizieren der Werbung"),
            )
            .await
        }
    }
}

/// Upload a creative; answers `{"url": ...}` or `{"error": ...}`.
///
/// POST /api/advertisements/images
#[instrument(skip(_admin, state, multipart))]
pub async fn upload_image(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(message) => return upload_error(StatusCode::BAD_REQUEST, &message),
    };

    match AdvertisementRepository::new(state.supabase())
        .upload_image(upload)
        .await
    {
        Ok(url) => Json(json!({ "url": url })).into_response(),
        Err(RepositoryError::Validation(message)) => {
            upload_error(StatusCode::BAD_REQUEST, &message)
        }
        Err(e) => {
            tracing::error!("Image upload failed: {e}");
            upload_error(StatusCode::BAD_GATEWAY, "Fehler beim Hochladen des Bildes")
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_formats(state: &AppState) -> Vec<AdFormat> {
    AdvertisementRepository::new(state.supabase())
        .formats()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch advertisement formats: {e}");
            vec![]
        })
}

/// First `file` field of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<ImageUpload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Ungültige Anfrage: {e}"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| "Die Datei ist zu groß (max. 5MB)".to_string())?;
        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err("Keine Datei ausgewählt".to_string())
}

fn upload_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
