use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub page_type: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PageCreateDBRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub page_type: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
}

/// Sparse update: only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct PageUpdateDBRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub page_type: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
}

impl PageUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.content.is_none()
            && self.page_type.is_none()
            && self.excerpt.is_none()
            && self.cover_image.is_none()
            && self.published.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageFilter {
    /// Hide unpublished pages (the public listing)
    pub published_only: bool,
    pub page_type: Option<String>,
}
