//! API request/response models for projects.
//!
//! `screenshots` and `technologies` are string arrays on the wire but TEXT
//! JSON columns in the database; the conversions here do the (de)encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::db::models::projects::{Project, ProjectCreateDBRequest, ProjectUpdateDBRequest};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectCreate {
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub long_description: Option<String>,
    pub color: Option<String>,
    /// "active", "paused" or "archived"; defaults to "active".
    pub status: Option<String>,
    pub screenshots: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub screenshots: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: String,
    pub long_description: Option<String>,
    pub color: String,
    pub status: String,
    pub screenshots: Vec<String>,
    pub technologies: Vec<String>,
    pub featured: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing projects.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListProjectsQuery {
    /// Include archived projects. Requires an authenticated admin.
    #[serde(default)]
    pub admin: bool,
}

fn decode_string_array(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            warn!("Ignoring malformed JSON array in project row: {e}");
            Vec::new()
        }),
        None => Vec::new(),
    }
}

fn encode_string_array(values: &[String]) -> String {
    // Serializing a Vec<String> cannot fail.
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            slug: project.slug,
            url: project.url,
            description: project.description,
            long_description: project.long_description,
            color: project.color,
            status: project.status,
            screenshots: decode_string_array(project.screenshots.as_deref()),
            technologies: decode_string_array(project.technologies.as_deref()),
            featured: project.featured,
            sort_order: project.sort_order,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

impl From<ProjectCreate> for ProjectCreateDBRequest {
    fn from(request: ProjectCreate) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
            url: request.url,
            description: request.description,
            long_description: request.long_description,
            color: request.color.unwrap_or_else(|| "#888888".to_string()),
            status: request.status.unwrap_or_else(|| "active".to_string()),
            screenshots: request.screenshots.as_deref().map(encode_string_array),
            technologies: request.technologies.as_deref().map(encode_string_array),
            featured: request.featured,
            sort_order: request.sort_order,
        }
    }
}

impl From<ProjectUpdate> for ProjectUpdateDBRequest {
    fn from(request: ProjectUpdate) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
            url: request.url,
            description: request.description,
            long_description: request.long_description,
            color: request.color,
            status: request.status,
            screenshots: request.screenshots.as_deref().map(encode_string_array),
            technologies: request.technologies.as_deref().map(encode_string_array),
            featured: request.featured,
            sort_order: request.sort_order,
        }
    }
}
