//! API request/response models for stored images.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::storage::StoredObject;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub key: String,
    pub size: u64,
    /// Path the image is served from.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageListResponse {
    pub images: Vec<ImageResponse>,
}

/// Query parameters for listing stored images.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListImagesQuery {
    /// Only keys beginning with this prefix.
    pub prefix: Option<String>,
    /// Cap on the number of results; defaults to 100.
    pub limit: Option<usize>,
}

impl From<StoredObject> for ImageResponse {
    fn from(object: StoredObject) -> Self {
        let url = format!("/api/images/{}", object.key);
        Self {
            key: object.key,
            size: object.size,
            url,
        }
    }
}
