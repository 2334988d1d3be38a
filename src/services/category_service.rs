//! 分类服务
//!
//! 顶级分类必须带图片，子分类不允许带图片；删除分类会级联删除子分类及其图片文件。

use crate::{
    error::{map_unique_violation, AppError},
    models::category::*,
    multipart::MultipartForm,
    repository::category_repo::CategoryRepository,
    response::FieldError,
    services::storage_service::{StorageService, UploadedFile},
};
use sqlx::PgPool;
use std::sync::Arc;

const RESOURCE: &str = "categories";
const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const NAME_EXISTS: &str = "Category name already exists";

pub struct CategoryService {
    db: PgPool,
    storage: Arc<StorageService>,
    max_image_bytes: usize,
}

impl CategoryService {
    pub fn new(db: PgPool, storage: Arc<StorageService>, max_image_bytes: usize) -> Self {
        Self {
            db,
            storage,
            max_image_bytes,
        }
    }

    fn repo(&self) -> CategoryRepository {
        CategoryRepository::new(self.db.clone())
    }

    /// 校验创建表单
    pub fn parse_create(&self, mut form: MultipartForm) -> Result<CreateCategoryInput, AppError> {
        let mut errors = Vec::new();

        let name = form.text("name").unwrap_or_default().trim().to_string();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name cannot be empty."));
        }

        let parent_id = match parse_parent_id(form.non_blank("parentId")) {
            Ok(parent_id) => parent_id.flatten(),
            Err(message) => {
                errors.push(FieldError::new("parentId", message));
                None
            }
        };

        let image = form.take_file("image");
        if let Some(image) = &image {
            if let Some(message) = check_image(image, self.max_image_bytes) {
                errors.push(FieldError::new("image", message));
            }
        }

        match (parent_id, &image) {
            (None, None) => errors.push(FieldError::new("image", "Image is required.")),
            (Some(_), Some(_)) => {
                errors.push(FieldError::new("image", "Image should not be provided."))
            }
            _ => {}
        }

        if !errors.is_empty() {
            return Err(AppError::invalid("", errors));
        }

        Ok(CreateCategoryInput {
            name,
            parent_id,
            image,
        })
    }

    /// 校验更新表单，所有字段可选
    pub fn parse_update(&self, mut form: MultipartForm) -> Result<UpdateCategoryInput, AppError> {
        let mut errors = Vec::new();

        let name = form.text("name").map(|n| n.trim().to_string());
        if matches!(&name, Some(n) if n.is_empty()) {
            errors.push(FieldError::new("name", "Name cannot be empty."));
        }

        let parent_id = parse_parent_id(form.non_blank("parentId")).unwrap_or_else(|message| {
            errors.push(FieldError::new("parentId", message));
            None
        });

        let image = form.take_file("image");
        if let Some(image) = &image {
            if let Some(message) = check_image(image, self.max_image_bytes) {
                errors.push(FieldError::new("image", message));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::invalid("", errors));
        }

        Ok(UpdateCategoryInput {
            name,
            parent_id,
            image,
        })
    }

    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, AppError> {
        let repo = self.repo();

        if let Some(parent_id) = input.parent_id {
            if !repo.exists(parent_id).await? {
                return Err(AppError::field("parentId", "Parent category not found"));
            }
        }

        if repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::conflict(NAME_EXISTS));
        }

        let image_url = match &input.image {
            Some(image) => Some(self.storage.save(RESOURCE, image).await?),
            None => None,
        };

        match repo
            .create(&input.name, input.parent_id, image_url.as_deref())
            .await
        {
            Ok(category) => {
                tracing::info!(category_id = category.id, name = %category.name, "Category created");
                Ok(category)
            }
            Err(e) => {
                if let Some(url) = &image_url {
                    self.storage.delete(url).await;
                }
                Err(map_unique_violation(e, NAME_EXISTS))
            }
        }
    }

    pub async fn update(&self, id: i64, input: UpdateCategoryInput) -> Result<Category, AppError> {
        let repo = self.repo();
        let existing = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))?;

        if let Some(name) = &input.name {
            if let Some(other) = repo.find_by_name(name).await? {
                if other.id != id {
                    return Err(AppError::conflict(NAME_EXISTS));
                }
            }
        }

        if let Some(Some(parent_id)) = input.parent_id {
            if parent_id == id {
                return Err(AppError::field("parentId", "Category cannot be its own parent"));
            }
            if !repo.exists(parent_id).await? {
                return Err(AppError::field("parentId", "Parent category not found"));
            }
            if repo.is_descendant(id, parent_id).await? {
                return Err(AppError::field(
                    "parentId",
                    "Category cannot be moved under one of its sub-categories",
                ));
            }
        }

        let parent_id = input.parent_id.unwrap_or(existing.parent_id);
        match (parent_id, &input.image, &existing.image_url) {
            (Some(_), Some(_), _) => {
                return Err(AppError::field("image", "Image should not be provided."))
            }
            (None, None, None) => return Err(AppError::field("image", "Image is required.")),
            _ => {}
        }

        let new_image_url = match &input.image {
            Some(image) => Some(self.storage.save(RESOURCE, image).await?),
            None => None,
        };

        // 新图替换旧图；变为子分类时丢弃旧图
        let image_url = match (&new_image_url, parent_id) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(_)) => None,
            (None, None) => existing.image_url.clone(),
        };

        let changes = CategoryChanges {
            name: input.name.unwrap_or_else(|| existing.name.clone()),
            parent_id,
            image_url,
        };

        let updated = match repo.update(id, &changes).await {
            Ok(Some(category)) => category,
            Ok(None) => {
                self.discard(new_image_url.as_deref()).await;
                return Err(AppError::not_found("Category not found"));
            }
            Err(e) => {
                self.discard(new_image_url.as_deref()).await;
                return Err(map_unique_violation(e, NAME_EXISTS));
            }
        };

        if existing.image_url != updated.image_url {
            self.discard(existing.image_url.as_deref()).await;
        }

        tracing::info!(category_id = id, "Category updated");
        Ok(updated)
    }

    /// 分页列出顶级分类（带子分类）
    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<CategoryDetail>, i64), AppError> {
        let repo = self.repo();
        let total = repo.count_top_level().await?;
        let categories = repo.list_top_level(limit, offset).await?;

        if categories.is_empty() {
            return Err(AppError::not_found("No categories found"));
        }

        let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
        let mut children = repo.children_of(&ids).await?;

        let details = categories
            .into_iter()
            .map(|category| CategoryDetail {
                children: children.remove(&category.id).unwrap_or_default(),
                parent: None,
                category,
            })
            .collect();

        Ok((details, total))
    }

    pub async fn get(&self, id: i64) -> Result<CategoryDetail, AppError> {
        let repo = self.repo();
        let category = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))?;

        let parent = match category.parent_id {
            Some(parent_id) => repo.find_by_id(parent_id).await?,
            None => None,
        };
        let children = repo
            .children_of(&[category.id])
            .await?
            .remove(&category.id)
            .unwrap_or_default();

        Ok(CategoryDetail {
            category,
            parent,
            children,
        })
    }

    /// 删除分类，子分类随外键级联删除，图片文件一并清理
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let repo = self.repo();
        if !repo.exists(id).await? {
            return Err(AppError::not_found("Category not found"));
        }

        let image_urls = repo.subtree_image_urls(id).await?;
        if !repo.delete(id).await? {
            return Err(AppError::not_found("Category not found"));
        }

        self.storage.delete_all(&image_urls).await;
        tracing::info!(category_id = id, files = image_urls.len(), "Category deleted");

        Ok(())
    }

    async fn discard(&self, stored_path: Option<&str>) {
        if let Some(path) = stored_path {
            self.storage.delete(path).await;
        }
    }
}

/// 解析 parentId：`Ok(None)` 未提供，`Ok(Some(None))` 为 0（顶级），`Ok(Some(Some(id)))` 为父分类
fn parse_parent_id(raw: Option<&str>) -> Result<Option<Option<i64>>, &'static str> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| "Expected number but received string")?;

    match value {
        v if v < 0 => Err("Parent id must be greater than or equal to 0"),
        0 => Ok(Some(None)),
        v => Ok(Some(Some(v))),
    }
}

fn check_image(image: &UploadedFile, max_bytes: usize) -> Option<String> {
    if !ALLOWED_TYPES.contains(&image.mime()) {
        return Some("Only JPEG, PNG, and WEBP are allowed.".to_string());
    }

    if image.size() > max_bytes {
        return Some(format!(
            "File is too large ({:.2}MB). Max allowed size is {}MB.",
            image.size() as f64 / 1024.0 / 1024.0,
            megabytes(max_bytes)
        ));
    }

    None
}

/// 整数 MB 不带小数
fn megabytes(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes % MB == 0 {
        (bytes / MB).to_string()
    } else {
        format!("{:.2}", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn image(mime: &str, size: usize) -> UploadedFile {
        UploadedFile {
            field: "image".to_string(),
            file_name: Some("pic".to_string()),
            content_type: Some(mime.to_string()),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_parse_parent_id() {
        assert_eq!(parse_parent_id(None), Ok(None));
        assert_eq!(parse_parent_id(Some("0")), Ok(Some(None)));
        assert_eq!(parse_parent_id(Some(" 12 ")), Ok(Some(Some(12))));
        assert_eq!(
            parse_parent_id(Some("abc")),
            Err("Expected number but received string")
        );
        assert_eq!(
            parse_parent_id(Some("-1")),
            Err("Parent id must be greater than or equal to 0")
        );
    }

    #[test]
    fn test_check_image_type_and_size() {
        assert!(check_image(&image("image/webp", 10), 1024 * 1024).is_none());
        assert_eq!(
            check_image(&image("image/gif", 10), 1024 * 1024).unwrap(),
            "Only JPEG, PNG, and WEBP are allowed."
        );
        assert_eq!(
            check_image(&image("image/png", 1024 * 1024 + 512 * 1024), 1024 * 1024).unwrap(),
            "File is too large (1.50MB). Max allowed size is 1MB."
        );
    }

    #[test]
    fn test_megabytes() {
        assert_eq!(megabytes(1024 * 1024), "1");
        assert_eq!(megabytes(512 * 1024), "0.50");
    }
}
