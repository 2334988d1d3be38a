//! 商品服务
//!
//! 商品行与特性图行在同一事务中写入；图片文件先落盘，数据库写入失败时回收。

use crate::{
    error::AppError,
    models::product::*,
    multipart::MultipartForm,
    repository::{category_repo::CategoryRepository, product_repo::ProductRepository},
    response::FieldError,
    services::storage_service::{StorageService, UploadedFile},
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::{str::FromStr, sync::Arc};

const RESOURCE: &str = "products";
const ALLOWED_TYPES: [&str; 2] = ["image/jpeg", "image/png"];
pub const MAX_FEATURE_IMAGES: usize = 5;
const NOT_A_NUMBER: &str = "Invalid type: Expected number but received string";

/// NUMERIC(12, 2) 可表示的最大值
fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

pub struct ProductService {
    db: PgPool,
    storage: Arc<StorageService>,
    max_image_bytes: usize,
}

impl ProductService {
    pub fn new(db: PgPool, storage: Arc<StorageService>, max_image_bytes: usize) -> Self {
        Self {
            db,
            storage,
            max_image_bytes,
        }
    }

    fn repo(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    // ==================== 表单校验 ====================

    pub fn parse_create(&self, mut form: MultipartForm) -> Result<CreateProductInput, AppError> {
        let mut errors = Vec::new();

        let name = form.non_blank("name").map(|n| n.trim().to_string());
        if name.is_none() {
            errors.push(FieldError::new("name", "Name is required"));
        }

        let category_id = optional_field(&mut errors, "categoryId", parse_id(form.non_blank("categoryId")));
        let description = form.non_blank("desc").map(|d| d.trim().to_string());
        let regular_price = optional_field(
            &mut errors,
            "regularPrice",
            parse_price(form.non_blank("regularPrice"), "Regular price"),
        );

        let sell_price = parse_price(form.non_blank("sellPrice"), "Sell price")
            .and_then(|p| p.ok_or_else(|| "Sell price is required".to_string()));
        let sell_price = required_field(&mut errors, "sellPrice", sell_price);

        let stock = parse_stock(form.non_blank("stock"))
            .and_then(|s| s.ok_or_else(|| "Stock is required".to_string()));
        let stock = required_field(&mut errors, "stock", stock);

        let main_image = form.take_file("mainImage");
        match &main_image {
            None => errors.push(FieldError::new("mainImage", "File is required")),
            Some(image) => self.check_into(&mut errors, "mainImage", image),
        }

        let feature_images = form.take_files("featureImages");
        self.check_feature_images(&mut errors, &feature_images, false);

        match (name, sell_price, stock, main_image) {
            (Some(name), Some(sell_price), Some(stock), Some(main_image)) if errors.is_empty() => {
                Ok(CreateProductInput {
                    name,
                    category_id,
                    description,
                    regular_price,
                    sell_price,
                    stock,
                    main_image,
                    feature_images,
                })
            }
            _ => Err(AppError::invalid("", errors)),
        }
    }

    pub fn parse_update(&self, mut form: MultipartForm) -> Result<UpdateProductInput, AppError> {
        let mut errors = Vec::new();

        let name = form.text("name").map(|n| n.trim().to_string());
        if matches!(&name, Some(n) if n.is_empty()) {
            errors.push(FieldError::new("name", "Name is required"));
        }

        let input = UpdateProductInput {
            name,
            category_id: optional_field(&mut errors, "categoryId", parse_id(form.non_blank("categoryId"))),
            description: form.non_blank("desc").map(|d| d.trim().to_string()),
            regular_price: optional_field(
                &mut errors,
                "regularPrice",
                parse_price(form.non_blank("regularPrice"), "Regular price"),
            ),
            sell_price: optional_field(
                &mut errors,
                "sellPrice",
                parse_price(form.non_blank("sellPrice"), "Sell price"),
            ),
            stock: optional_field(&mut errors, "stock", parse_stock(form.non_blank("stock"))),
            main_image: form.take_file("mainImage"),
        };

        if let Some(image) = &input.main_image {
            self.check_into(&mut errors, "mainImage", image);
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(AppError::invalid("", errors))
        }
    }

    /// 追加特性图表单：至少一张，最多五张
    pub fn parse_feature_images(&self, mut form: MultipartForm) -> Result<Vec<UploadedFile>, AppError> {
        let mut errors = Vec::new();
        let images = form.take_files("featureImages");
        self.check_feature_images(&mut errors, &images, true);

        if errors.is_empty() {
            Ok(images)
        } else {
            Err(AppError::invalid("", errors))
        }
    }

    fn check_feature_images(&self, errors: &mut Vec<FieldError>, images: &[UploadedFile], required: bool) {
        if required && images.is_empty() {
            errors.push(FieldError::new("featureImages", "File is required"));
        }
        if images.len() > MAX_FEATURE_IMAGES {
            errors.push(FieldError::new(
                "featureImages",
                format!("A maximum of {} feature images is allowed", MAX_FEATURE_IMAGES),
            ));
        }
        for image in images {
            self.check_into(errors, "featureImages", image);
        }
    }

    fn check_into(&self, errors: &mut Vec<FieldError>, field: &str, image: &UploadedFile) {
        if let Some(message) = check_image(image, self.max_image_bytes) {
            errors.push(FieldError::new(field, message));
        }
    }

    // ==================== 业务操作 ====================

    async fn ensure_category(&self, category_id: Option<i64>) -> Result<(), AppError> {
        if let Some(category_id) = category_id {
            if !CategoryRepository::new(self.db.clone()).exists(category_id).await? {
                return Err(AppError::field("categoryId", "Invalid category ID"));
            }
        }
        Ok(())
    }

    /// 依次保存文件，任一失败则回收已写入的文件
    async fn save_all(&self, files: &[&UploadedFile]) -> Result<Vec<String>, AppError> {
        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            match self.storage.save(RESOURCE, file).await {
                Ok(path) => saved.push(path),
                Err(e) => {
                    self.storage.delete_all(&saved).await;
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }

    pub async fn create(&self, seller_id: i64, input: CreateProductInput) -> Result<ProductDetail, AppError> {
        self.ensure_category(input.category_id).await?;

        let mut files = vec![&input.main_image];
        files.extend(input.feature_images.iter());
        let mut saved = self.save_all(&files).await?;
        let feature_urls = saved.split_off(1);
        let main_url = saved.remove(0);

        let new_product = NewProduct {
            seller_id,
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            regular_price: input.regular_price,
            sell_price: input.sell_price,
            stock: input.stock,
            image_url: main_url.clone(),
        };

        let (product, images) = match self.repo().create_with_images(&new_product, &feature_urls).await {
            Ok(created) => created,
            Err(e) => {
                self.storage.delete(&main_url).await;
                self.storage.delete_all(&feature_urls).await;
                return Err(e);
            }
        };

        tracing::info!(
            product_id = product.id,
            seller_id,
            images = images.len(),
            "Product created"
        );

        let category = self.category_of(&product).await?;
        Ok(ProductDetail {
            product,
            category,
            seller: None,
            images,
        })
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<ProductDetail>, i64), AppError> {
        let repo = self.repo();
        let total = repo.count().await?;
        let products = repo.list(limit, offset).await?;

        if products.is_empty() {
            return Err(AppError::not_found("No products found"));
        }

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let mut category_ids: Vec<i64> = products.iter().filter_map(|p| p.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();

        let mut images = repo.images_for(&ids).await?;
        let categories = repo.categories_for(&category_ids).await?;

        let details = products
            .into_iter()
            .map(|product| ProductDetail {
                category: product.category_id.and_then(|id| categories.get(&id).cloned()),
                seller: None,
                images: images.remove(&product.id).unwrap_or_default(),
                product,
            })
            .collect();

        Ok((details, total))
    }

    pub async fn get(&self, id: i64) -> Result<ProductDetail, AppError> {
        let repo = self.repo();
        let product = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        let category = self.category_of(&product).await?;
        let seller = repo.find_seller(product.seller_id).await?;
        let images = repo.images_for(&[id]).await?.remove(&id).unwrap_or_default();

        Ok(ProductDetail {
            product,
            category,
            seller,
            images,
        })
    }

    pub async fn update(&self, id: i64, input: UpdateProductInput) -> Result<ProductDetail, AppError> {
        let repo = self.repo();
        let existing = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        self.ensure_category(input.category_id).await?;

        let new_main_url = match &input.main_image {
            Some(image) => Some(self.storage.save(RESOURCE, image).await?),
            None => None,
        };

        let changes = ProductChanges {
            name: input.name,
            category_id: input.category_id,
            description: input.description,
            regular_price: input.regular_price,
            sell_price: input.sell_price,
            stock: input.stock,
            image_url: new_main_url.clone(),
        };

        let updated = match repo.update(id, &changes).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                if let Some(url) = &new_main_url {
                    self.storage.delete(url).await;
                }
                return Err(AppError::not_found("Product not found"));
            }
            Err(e) => {
                if let Some(url) = &new_main_url {
                    self.storage.delete(url).await;
                }
                return Err(e);
            }
        };

        if new_main_url.is_some() {
            if let Some(old) = &existing.image_url {
                self.storage.delete(old).await;
            }
        }

        tracing::info!(product_id = id, "Product updated");

        let category = self.category_of(&updated).await?;
        let images = repo.images_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(ProductDetail {
            product: updated,
            category,
            seller: None,
            images,
        })
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let repo = self.repo();
        let product = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        let images = repo.images_for(&[id]).await?.remove(&id).unwrap_or_default();

        if !repo.delete(id).await? {
            return Err(AppError::not_found("Product not found"));
        }

        let mut urls: Vec<String> = images.into_iter().map(|i| i.image_url).collect();
        urls.extend(product.image_url);
        self.storage.delete_all(&urls).await;

        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }

    pub async fn add_images(&self, id: i64, files: Vec<UploadedFile>) -> Result<Vec<ProductImage>, AppError> {
        let repo = self.repo();
        if repo.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found("Product not found"));
        }

        let refs: Vec<&UploadedFile> = files.iter().collect();
        let urls = self.save_all(&refs).await?;

        match repo.add_images(id, &urls).await {
            Ok(images) => {
                tracing::info!(product_id = id, images = images.len(), "Product images added");
                Ok(images)
            }
            Err(e) => {
                self.storage.delete_all(&urls).await;
                Err(e)
            }
        }
    }

    async fn category_of(&self, product: &Product) -> Result<Option<crate::models::category::Category>, AppError> {
        match product.category_id {
            Some(category_id) => CategoryRepository::new(self.db.clone()).find_by_id(category_id).await,
            None => Ok(None),
        }
    }
}

fn optional_field<T>(errors: &mut Vec<FieldError>, field: &str, parsed: Result<Option<T>, String>) -> Option<T> {
    parsed.unwrap_or_else(|message| {
        errors.push(FieldError::new(field, message));
        None
    })
}

fn required_field<T>(errors: &mut Vec<FieldError>, field: &str, parsed: Result<T, String>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn parse_id(raw: Option<&str>) -> Result<Option<i64>, String> {
    raw.map(|r| r.trim().parse::<i64>().map_err(|_| NOT_A_NUMBER.to_string()))
        .transpose()
}

fn parse_price(raw: Option<&str>, label: &str) -> Result<Option<Decimal>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let price = Decimal::from_str(raw.trim()).map_err(|_| NOT_A_NUMBER.to_string())?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(format!("{} must be greater than or equal to 0", label));
    }
    if price > max_price() {
        return Err(format!("{} must not exceed {}", label, max_price()));
    }

    Ok(Some(price.round_dp(2)))
}

fn parse_stock(raw: Option<&str>) -> Result<Option<i32>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let stock: i32 = raw.trim().parse().map_err(|_| NOT_A_NUMBER.to_string())?;
    if stock < 0 {
        return Err("Stock must be greater than or equal to 0".to_string());
    }

    Ok(Some(stock))
}

fn check_image(image: &UploadedFile, max_bytes: usize) -> Option<String> {
    if !ALLOWED_TYPES.contains(&image.mime()) {
        return Some("Only JPG and PNG files are allowed".to_string());
    }
    if image.size() > max_bytes {
        return Some(format!(
            "File size must not exceed {}MB",
            max_bytes / (1024 * 1024)
        ));
    }
    None
}
