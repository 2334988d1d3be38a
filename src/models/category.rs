//! Category domain models

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::storage_service::UploadedFile;

/// Category row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category with its parent and direct children
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<Category>,
    pub children: Vec<Category>,
}

/// Paginated top-level category listing
#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: Vec<CategoryDetail>,
    pub pagination: crate::pagination::Pagination,
}

/// Validated multipart input for creating a category
#[derive(Debug)]
pub struct CreateCategoryInput {
    pub name: String,
    /// `None` for a top-level category
    pub parent_id: Option<i64>,
    pub image: Option<UploadedFile>,
}

/// Validated multipart input for updating a category
#[derive(Debug, Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    /// `Some(None)` moves the category to the top level
    pub parent_id: Option<Option<i64>>,
    pub image: Option<UploadedFile>,
}

/// Column values written by an update
#[derive(Debug)]
pub struct CategoryChanges {
    pub name: String,
    pub parent_id: Option<i64>,
    pub image_url: Option<String>,
}
