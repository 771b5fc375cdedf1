//! Blog CMS route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tigube_core::{BlogPostId, PostStatus};

use crate::db::{BlogRepository, RepositoryError};
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::{BlogDraft, BlogForm, BlogPost, CurrentAdmin, Flash};
use crate::routes::{AdminUserView, redirect_with, render};
use crate::state::AppState;

/// Build the blog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(index).post(create))
        .route("/blog/new", get(new_post))
        .route("/blog/{id}", get(edit).post(update))
        .route("/blog/{id}/delete", post(delete))
        .route("/blog/{id}/publish", post(publish))
}

// =============================================================================
// Templates
// =============================================================================

/// Blog list template.
#[derive(Template)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub posts: Vec<BlogPost>,
    pub status: Option<PostStatus>,
    pub statuses: Vec<PostStatus>,
    pub load_error: bool,
}

/// Blog editor template, shared by create and edit.
#[derive(Template)]
#[template(path = "blog/form.html")]
pub struct BlogFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub form: BlogForm,
    /// Where the form posts to.
    pub action: String,
    pub post_id: Option<BlogPostId>,
    pub statuses: Vec<PostStatus>,
    pub error: Option<String>,
}

impl BlogFormTemplate {
    fn new(admin: &CurrentAdmin, form: BlogForm, post_id: Option<BlogPostId>) -> Self {
        let action = post_id.map_or_else(|| "/blog".to_string(), |id| format!("/blog/{id}"));
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/blog".to_string(),
            flash: None,
            form,
            action,
            post_id,
            statuses: PostStatus::ALL.to_vec(),
            error: None,
        }
    }

    fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters of the blog list.
#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    pub status: Option<String>,
}

/// Publish toggle form.
#[derive(Debug, Deserialize)]
pub struct PublishForm {
    /// `true` publishes, anything else unpublishes.
    pub publish: String,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Blog list handler.
///
/// GET /blog
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BlogQuery>,
) -> Html<String> {
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<PostStatus>().ok());

    let (posts, load_error) = match BlogRepository::new(state.supabase()).list(status).await {
        Ok(posts) => (posts, false),
        Err(e) => {
            tracing::error!("Failed to fetch blog posts: {e}");
            (vec![], true)
        }
    };

    render(&BlogIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/blog".to_string(),
        flash: take_flash(&session).await,
        posts,
        status,
        statuses: PostStatus::ALL.to_vec(),
        load_error,
    })
}

/// Empty editor.
///
/// GET /blog/new
#[instrument(skip(admin))]
pub async fn new_post(RequireAdminAuth(admin): RequireAdminAuth) -> Html<String> {
    let form = BlogForm::from(&BlogDraft::empty());
    render(&BlogFormTemplate::new(&admin, form, None))
}

/// Create a post.
///
/// POST /blog
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<BlogForm>,
) -> Response {
    let draft = match BlogDraft::from_form(form.clone()) {
        Ok(draft) => draft,
        Err(message) => {
            return render(&BlogFormTemplate::new(&admin, form, None).with_error(message))
                .into_response();
        }
    };

    match BlogRepository::new(state.supabase())
        .create(&draft, admin.id)
        .await
    {
        Ok(post) => redirect_with(
            &session,
            &format!("/blog/{}", post.id),
            Flash::success("Beitrag wurde erstellt."),
        )
        .await
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to create blog post: {e}");
            render(&BlogFormTemplate::new(&admin, form, None).with_error(save_error(&e)))
                .into_response()
        }
    }
}

/// Editor for an existing post.
///
/// GET /blog/{id}
#[instrument(skip(admin, state, session))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
) -> Response {
    match BlogRepository::new(state.supabase()).get(id).await {
        Ok(post) => {
            let form = BlogForm::from(&BlogDraft::from_post(&post));
            let mut template = BlogFormTemplate::new(&admin, form, Some(id));
            template.flash = take_flash(&session).await;
            render(&template).into_response()
        }
        Err(e) => {
            if !matches!(e, RepositoryError::NotFound) {
                tracing::error!(post_id = %id, "Failed to fetch blog post: {e}");
            }
            redirect_with(&session, "/blog", Flash::error("Beitrag nicht gefunden."))
                .await
                .into_response()
        }
    }
}

/// Save an existing post.
///
/// POST /blog/{id}
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
    Form(form): Form<BlogForm>,
) -> Response {
    let draft = match BlogDraft::from_form(form.clone()) {
        Ok(draft) => draft,
        Err(message) => {
            return render(&BlogFormTemplate::new(&admin, form, Some(id)).with_error(message))
                .into_response();
        }
    };

    match BlogRepository::new(state.supabase()).update(id, &draft).await {
        Ok(_) => redirect_with(
            &session,
            &format!("/blog/{id}"),
            Flash::success("Beitrag wurde gespeichert."),
        )
        .await
        .into_response(),
        Err(e) => {
            tracing::error!(post_id = %id, "Failed to update blog post: {e}");
            render(&BlogFormTemplate::new(&admin, form, Some(id)).with_error(save_error(&e)))
                .into_response()
        }
    }
}

/// Delete a post.
///
/// POST /blog/{id}/delete
#[instrument(skip(_admin, state, session))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
) -> Redirect {
    let flash = match BlogRepository::new(state.supabase()).delete(id).await {
        Ok(()) => Flash::success("Beitrag wurde gelöscht."),
        Err(e) => {
            tracing::error!(post_id = %id, "Failed to delete blog post: {e}");
            Flash::error("Fehler beim Löschen des Beitrags.")
        }
    };
    redirect_with(&session, "/blog", flash).await
}

/// Publish or unpublish a post.
///
/// POST /blog/{id}/publish
#[instrument(skip(_admin, state, session, form))]
pub async fn publish(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
    Form(form): Form<PublishForm>,
) -> Redirect {
    let publish = form.publish == "true";
    let flash = match BlogRepository::new(state.supabase())
        .set_published(id, publish)
        .await
    {
        Ok(()) if publish => Flash::success("Beitrag wurde veröffentlicht."),
        Ok(()) => Flash::success("Beitrag ist wieder ein Entwurf."),
        Err(e) => {
            tracing::error!(post_id = %id, "Failed to change publish state: {e}");
            Flash::error("Fehler beim Ändern des Veröffentlichungsstatus.")
        }
    };
    redirect_with(&session, "/blog", flash).await
}

/// Message shown when saving fails.
fn save_error(err: &RepositoryError) -> String {
    match err {
        RepositoryError::Backend(e) if e.is_unique_violation() => {
            "Dieser Slug wird bereits verwendet.".to_string()
        }
        RepositoryError::Validation(message) => message.clone(),
        _ => "Fehler beim Speichern des Beitrags.".to_string(),
    }
}
