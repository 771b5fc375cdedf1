//! Blog posts of the public site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tigube_core::{BlogPostId, PostStatus, UserId};

/// A stored blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author_id: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    /// Parsed status; unset rows are drafts.
    #[must_use]
    pub fn status(&self) -> PostStatus {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(PostStatus::Draft)
    }

    /// Whether the post is live.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status() == PostStatus::Published
    }
}

/// Submitted blog form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub status: String,
}

impl From<&BlogDraft> for BlogForm {
    fn from(draft: &BlogDraft) -> Self {
        Self {
            title: draft.title.clone(),
            slug: draft.slug.clone(),
            excerpt: draft.excerpt.clone().unwrap_or_default(),
            content: draft.content.clone().unwrap_or_default(),
            cover_image_url: draft.cover_image_url.clone().unwrap_or_default(),
            status: draft.status.as_str().to_string(),
        }
    }
}

/// Writable columns of `blog_posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: PostStatus,
}

impl BlogDraft {
    /// Validate a submitted form.
    ///
    /// An empty slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns a German message when the title is missing, no usable slug
    /// can be formed, or the status is unknown.
    pub fn from_form(form: BlogForm) -> Result<Self, String> {
        let title = form.title.trim().to_string();
        if title.is_empty() {
            return Err("Bitte geben Sie einen Titel ein.".to_string());
        }
        let slug = if form.slug.trim().is_empty() {
            slugify(&title)
        } else {
            slugify(&form.slug)
        };
        if slug.is_empty() {
            return Err("Aus dem Titel lässt sich kein Slug bilden.".to_string());
        }
        let status = if form.status.trim().is_empty() {
            PostStatus::Draft
        } else {
            form.status
                .trim()
                .parse()
                .map_err(|_| "Unbekannter Status.".to_string())?
        };

        Ok(Self {
            title,
            slug,
            excerpt: non_empty(form.excerpt),
            content: non_empty(form.content),
            cover_image_url: non_empty(form.cover_image_url),
            status,
        })
    }

    /// Prefill from an existing post.
    #[must_use]
    pub fn from_post(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone().unwrap_or_default(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
            cover_image_url: post.cover_image_url.clone(),
            status: post.status(),
        }
    }

    /// An empty draft for the "new post" form.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            title: String::new(),
            slug: String::new(),
            excerpt: None,
            content: None,
            cover_image_url: None,
            status: PostStatus::Draft,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Insert payload for a new post.
#[derive(Debug, Serialize)]
pub struct NewBlogPost<'a> {
    #[serde(flatten)]
    pub draft: &'a BlogDraft,
    pub author_id: UserId,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Update payload for an existing post.
#[derive(Debug, Serialize)]
pub struct BlogChanges<'a> {
    #[serde(flatten)]
    pub draft: &'a BlogDraft,
    pub updated_at: DateTime<Utc>,
}

/// Publish/unpublish payload.
#[derive(Debug, Serialize)]
pub struct PublishChange {
    pub status: PostStatus,
    /// Set when publishing, cleared when unpublishing.
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// URL slug: lowercase ASCII, German umlauts transliterated, runs of other
/// characters collapsed into single hyphens.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let replacement = match c {
            'ä' => Some("ae"),
            'ö' => Some("oe"),
            'ü' => Some("ue"),
            'ß' => Some("ss"),
            _ => None,
        };
        if let Some(text) = replacement {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push_str(text);
        } else if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Die 10 besten Tipps für Hundebesitzer!"), "die-10-besten-tipps-fuer-hundebesitzer");
        assert_eq!(slugify("  Größe & Gewicht  "), "groesse-gewicht");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_form_derives_slug() {
        let draft = BlogDraft::from_form(BlogForm {
            title: "Katzen im Sommer".to_string(),
            content: "Text".to_string(),
            ..BlogForm::default()
        })
        .unwrap();
        assert_eq!(draft.slug, "katzen-im-sommer");
        assert_eq!(draft.status, PostStatus::Draft);
        assert_eq!(draft.excerpt, None);
    }

    #[test]
    fn test_form_validation() {
        assert!(BlogDraft::from_form(BlogForm::default()).is_err());
        let err = BlogDraft::from_form(BlogForm {
            title: "Titel".to_string(),
            status: "live".to_string(),
            ..BlogForm::default()
        })
        .unwrap_err();
        assert_eq!(err, "Unbekannter Status.");
    }
}
