use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Project row. `screenshots` and `technologies` hold JSON arrays as TEXT;
/// the API layer decodes them.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: String,
    pub long_description: Option<String>,
    pub color: String,
    pub status: String,
    pub screenshots: Option<String>,
    pub technologies: Option<String>,
    pub featured: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: String,
    pub long_description: Option<String>,
    pub color: String,
    pub status: String,
    pub screenshots: Option<String>,
    pub technologies: Option<String>,
    pub featured: bool,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectUpdateDBRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub screenshots: Option<String>,
    pub technologies: Option<String>,
    pub featured: Option<bool>,
    pub sort_order: Option<i64>,
}

impl ProjectUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.long_description.is_none()
            && self.color.is_none()
            && self.status.is_none()
            && self.screenshots.is_none()
            && self.technologies.is_none()
            && self.featured.is_none()
            && self.sort_order.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Include archived projects (the admin listing)
    pub include_archived: bool,
}
