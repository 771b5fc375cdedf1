//! Blog post repository.

use chrono::Utc;
use tracing::instrument;

use tigube_core::{BlogPostId, PostStatus, UserId};

use super::RepositoryError;
use crate::models::blog::{BlogChanges, BlogDraft, BlogPost, NewBlogPost, PublishChange};
use crate::supabase::{Query, SupabaseClient};

const TABLE: &str = "blog_posts";

/// Repository for `blog_posts`.
pub struct BlogRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> BlogRepository<'a> {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Posts, optionally restricted to `status`, most recently edited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<PostStatus>) -> Result<Vec<BlogPost>, RepositoryError> {
        let mut query = Query::select("*");
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        Ok(self
            .client
            .select(TABLE, &query.order("updated_at", false))
            .await?)
    }

    /// A single post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no post has this ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: BlogPostId) -> Result<BlogPost, RepositoryError> {
        self.client
            .select_single(TABLE, &Query::select("*").eq("id", id))
            .await
            .map_err(RepositoryError::from_single)
    }

    /// Create a post. Posts created as published get `published_at` now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the insert fails, e.g. on a
    /// duplicate slug.
    #[instrument(skip(self, draft), fields(slug = %draft.slug))]
    pub async fn create(&self, draft: &BlogDraft, author: UserId) -> Result<BlogPost, RepositoryError> {
        let now = Utc::now();
        let row = NewBlogPost {
            draft,
            author_id: author,
            published_at: (draft.status == PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };
        let inserted: Vec<BlogPost> = self.client.insert(TABLE, &row).await?;
        let post = inserted.into_iter().next().ok_or(RepositoryError::NotFound)?;
        tracing::info!(post_id = %post.id, "Blog post created");
        Ok(post)
    }

    /// Overwrite the editable columns of a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no post has this ID.
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: BlogPostId, draft: &BlogDraft) -> Result<BlogPost, RepositoryError> {
        let changes = BlogChanges {
            draft,
            updated_at: Utc::now(),
        };
        let updated: Vec<BlogPost> = self
            .client
            .update(TABLE, &Query::new().eq("id", id), &changes)
            .await?;
        updated.into_iter().next().ok_or(RepositoryError::NotFound)
    }

    /// Publish or withdraw a post.
    ///
    /// Withdrawn posts go back to draft and lose their publish date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no post has this ID.
    #[instrument(skip(self))]
    pub async fn set_published(&self, id: BlogPostId, published: bool) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let change = PublishChange {
            status: if published {
                PostStatus::Published
            } else {
                PostStatus::Draft
            },
            published_at: published.then_some(now),
            updated_at: now,
        };
        let updated: Vec<serde_json::Value> = self
            .client
            .update(TABLE, &Query::new().eq("id", id), &change)
            .await?;
        if updated.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(post_id = %id, published, "Blog post publish state changed");
        Ok(())
    }

    /// Delete a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: BlogPostId) -> Result<(), RepositoryError> {
        self.client.delete(TABLE, &Query::new().eq("id", id)).await?;
        tracing::info!(post_id = %id, "Blog post deleted");
        Ok(())
    }
}
