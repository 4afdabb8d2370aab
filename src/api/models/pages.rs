//! API request/response models for pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::pages::{Page, PageCreateDBRequest, PageUpdateDBRequest};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageCreate {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    /// Defaults to "page"; the original site also uses "post".
    pub page_type: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub page_type: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageResponse {
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

/// Query parameters for listing pages.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListPagesQuery {
    /// Filter by page type ("page", "post", ...).
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    /// Include drafts. Requires an authenticated admin.
    #[serde(default)]
    pub admin: bool,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            content: page.content,
            page_type: page.page_type,
            excerpt: page.excerpt,
            cover_image: page.cover_image,
            published: page.published,
            published_at: page.published_at,
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

impl From<PageCreate> for PageCreateDBRequest {
    fn from(request: PageCreate) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            content: request.content,
            page_type: request.page_type.unwrap_or_else(|| "page".to_string()),
            excerpt: request.excerpt,
            cover_image: request.cover_image,
            published: request.published,
        }
    }
}

impl From<PageUpdate> for PageUpdateDBRequest {
    fn from(request: PageUpdate) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            content: request.content,
            page_type: request.page_type,
            excerpt: request.excerpt,
            cover_image: request.cover_image,
            published: request.published,
        }
    }
}
