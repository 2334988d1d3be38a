//! 服务层集成测试（需要 TEST_DATABASE_URL 指向可用的 Postgres）

use axum::body::Bytes;
use rust_decimal::Decimal;
use shop_service::{
    error::AppError,
    models::{
        auth::LoginRequest,
        cart::{CreateCartRequest, UpdateCartRequest},
        category::{CreateCategoryInput, UpdateCategoryInput},
        product::{CreateProductInput, UpdateProductInput},
        role::{AssignPermissionsRequest, CreateRoleRequest},
    },
    services::{role_service::AssignOutcome, storage_service::UploadedFile},
};
use serial_test::serial;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

mod common;
use common::{create_test_app_state, create_test_config, create_test_product, create_test_user, setup_test_db};

fn png(name: &str) -> UploadedFile {
    UploadedFile {
        field: "image".to_string(),
        file_name: Some(name.to_string()),
        content_type: Some("image/png".to_string()),
        bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nfake"),
    }
}

fn field_of(error: &AppError) -> String {
    error.field_errors().expect("expected field errors")[0].field.clone()
}

fn message_of(error: &AppError) -> String {
    error.field_errors().expect("expected field errors")[0].message.clone()
}

/// 入库路径对应的磁盘文件
fn on_disk(uploads_dir: &str, stored: &str) -> PathBuf {
    Path::new(uploads_dir).join(stored.strip_prefix("uploads/").expect("stored under uploads/"))
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn product_input(name: &str, feature_images: Vec<UploadedFile>) -> CreateProductInput {
    CreateProductInput {
        name: name.to_string(),
        category_id: None,
        description: Some("Warm light".to_string()),
        regular_price: Some(Decimal::from_str("24.99").unwrap()),
        sell_price: Decimal::from_str("19.99").unwrap(),
        stock: 5,
        main_image: png("main.png"),
        feature_images,
    }
}

// ==================== 认证 ====================

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_login_embeds_role_and_permissions() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    create_test_user(&pool, "Admin", "admin@example.com", "secret123", Some("Super-admin"))
        .await
        .expect("Failed to create test user");

    let state = create_test_app_state(config, pool);

    let response = state
        .auth_service
        .login(LoginRequest {
            email: "admin@example.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .expect("Login should succeed");

    let claims = state.jwt_service.validate_access_token(&response.token).unwrap();
    assert_eq!(claims.role.as_deref(), Some("Super-admin"));
    assert!(claims.permissions.contains(&"delete".to_string()));
    assert_eq!(response.user.role.as_deref(), Some("Super-admin"));
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_login_unknown_email() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool);

    let error = state
        .auth_service
        .login(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(error.code(), 400);
    assert_eq!(error.user_message(), "Invalid credentials!");
}

// ==================== 角色 ====================

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_create_role_rejects_duplicate_name() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool);

    let error = state
        .role_service
        .create(CreateRoleRequest {
            name: "Customer".to_string(),
            desc: None,
        })
        .await
        .unwrap_err();

    assert_eq!(error.code(), 400);
    assert_eq!(field_of(&error), "name");
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_assign_permissions_flow() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool.clone());

    let role = state
        .role_service
        .create(CreateRoleRequest {
            name: "Editor".to_string(),
            desc: Some("Edits the catalog".to_string()),
        })
        .await
        .unwrap();

    let permission_ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM permissions WHERE name IN ('create', 'update') ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    // 未知权限 ID
    let error = state
        .role_service
        .assign_permissions(AssignPermissionsRequest {
            role_id: role.id,
            permission_ids: vec![permission_ids[0], 999_999],
        })
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "permissionIds");
    assert!(error.field_errors().unwrap()[0].message.contains("999999"));

    let outcome = state
        .role_service
        .assign_permissions(AssignPermissionsRequest {
            role_id: role.id,
            permission_ids: permission_ids.clone(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, AssignOutcome::Assigned(2));

    // 重复分配不报错
    let outcome = state
        .role_service
        .assign_permissions(AssignPermissionsRequest {
            role_id: role.id,
            permission_ids,
        })
        .await
        .unwrap();
    assert_eq!(outcome, AssignOutcome::AlreadyAssigned);

    let detail = state.role_service.get(role.id).await.unwrap();
    assert_eq!(detail.permissions.len(), 2);
}

// ==================== 分类 ====================

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_category_tree_and_delete() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool);

    let root = state
        .category_service
        .create(CreateCategoryInput {
            name: "Electronics".to_string(),
            parent_id: None,
            image: Some(png("electronics.png")),
        })
        .await
        .unwrap();
    let image_path = root.image_url.clone().unwrap();
    assert!(image_path.starts_with("uploads/categories/"));

    let child = state
        .category_service
        .create(CreateCategoryInput {
            name: "Phones".to_string(),
            parent_id: Some(root.id),
            image: None,
        })
        .await
        .unwrap();
    assert_eq!(child.parent_id, Some(root.id));

    // 名称重复
    let error = state
        .category_service
        .create(CreateCategoryInput {
            name: "Phones".to_string(),
            parent_id: Some(root.id),
            image: None,
        })
        .await
        .unwrap_err();
    assert_eq!(error.code(), 409);

    let (categories, total) = state.category_service.list(10, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(categories[0].children.len(), 1);

    let detail = state.category_service.get(child.id).await.unwrap();
    assert_eq!(detail.parent.map(|p| p.id), Some(root.id));

    state.category_service.delete(root.id).await.unwrap();
    assert_eq!(state.category_service.get(child.id).await.unwrap_err().code(), 404);
}

// ==================== 购物车 ====================

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_cart_stock_and_subtotal() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let user_id = create_test_user(&pool, "Jane", "jane@example.com", "secret123", Some("Customer"))
        .await
        .unwrap();
    let lamp = create_test_product(&pool, user_id, "Lamp", "19.99", 3).await.unwrap();
    let mug = create_test_product(&pool, user_id, "Mug", "5.50", 10).await.unwrap();

    let state = create_test_app_state(config, pool);
    let carts = &state.cart_service;

    // 库存不足
    let error = carts
        .add(user_id, CreateCartRequest { product_id: lamp, quantity: 4 })
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "quantity");

    let item = carts
        .add(user_id, CreateCartRequest { product_id: lamp, quantity: 2 })
        .await
        .unwrap();
    carts
        .add(user_id, CreateCartRequest { product_id: mug, quantity: 1 })
        .await
        .unwrap();

    // 同一商品只能加入一次
    let error = carts
        .add(user_id, CreateCartRequest { product_id: lamp, quantity: 1 })
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "productId");

    let updated = carts
        .update(user_id, item.id, UpdateCartRequest { quantity: 3 })
        .await
        .unwrap();
    assert_eq!(updated.quantity, 3);

    // 第一页只有一条，小计覆盖整个购物车
    let (items, total, subtotal) = carts.list(user_id, 1, 0).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(total, 2);
    assert_eq!(subtotal, Decimal::from_str("65.47").unwrap());

    // 其他用户看不到这条记录
    assert_eq!(carts.remove(user_id + 1000, item.id).await.unwrap_err().code(), 404);

    assert_eq!(carts.clear(user_id).await.unwrap(), 2);
    assert_eq!(carts.list(user_id, 10, 0).await.unwrap_err().code(), 404);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_category_update_parent_rules() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool);
    let categories = &state.category_service;

    let root = categories
        .create(CreateCategoryInput {
            name: "Home".to_string(),
            parent_id: None,
            image: Some(png("home.png")),
        })
        .await
        .unwrap();
    let child = categories
        .create(CreateCategoryInput {
            name: "Lighting".to_string(),
            parent_id: Some(root.id),
            image: None,
        })
        .await
        .unwrap();

    let error = categories
        .update(
            root.id,
            UpdateCategoryInput {
                parent_id: Some(Some(root.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "parentId");
    assert_eq!(message_of(&error), "Category cannot be its own parent");

    let error = categories
        .update(
            root.id,
            UpdateCategoryInput {
                parent_id: Some(Some(child.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "parentId");
    assert_eq!(
        message_of(&error),
        "Category cannot be moved under one of its sub-categories"
    );

    let error = categories
        .update(
            root.id,
            UpdateCategoryInput {
                parent_id: Some(Some(999_999)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(message_of(&error), "Parent category not found");
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_category_update_image_rules() {
    let config = create_test_config();
    let uploads = config.uploads.dir.clone();
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool);
    let categories = &state.category_service;

    let root = categories
        .create(CreateCategoryInput {
            name: "Garden".to_string(),
            parent_id: None,
            image: Some(png("garden.png")),
        })
        .await
        .unwrap();
    let child = categories
        .create(CreateCategoryInput {
            name: "Tools".to_string(),
            parent_id: Some(root.id),
            image: None,
        })
        .await
        .unwrap();

    // 子分类不能带图
    let error = categories
        .update(
            child.id,
            UpdateCategoryInput {
                image: Some(png("tools.png")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "image");
    assert_eq!(message_of(&error), "Image should not be provided.");

    // 变为顶级分类时必须带图
    let error = categories
        .update(
            child.id,
            UpdateCategoryInput {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_of(&error), "image");
    assert_eq!(message_of(&error), "Image is required.");

    let promoted = categories
        .update(
            child.id,
            UpdateCategoryInput {
                parent_id: Some(None),
                image: Some(png("tools.png")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.parent_id, None);
    let promoted_image = promoted.image_url.clone().unwrap();
    assert!(on_disk(&uploads, &promoted_image).exists());

    // 移到父分类下会丢弃原图
    let moved = categories
        .update(
            child.id,
            UpdateCategoryInput {
                name: Some("Garden Tools".to_string()),
                parent_id: Some(Some(root.id)),
                image: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(root.id));
    assert_eq!(moved.name, "Garden Tools");
    assert!(moved.image_url.is_none());
    assert!(!on_disk(&uploads, &promoted_image).exists());
}

// ==================== 商品 ====================

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_product_create_stores_feature_images() {
    let config = create_test_config();
    let uploads = config.uploads.dir.clone();
    let pool = setup_test_db(&config).await;
    let seller = create_test_user(&pool, "Sam", "sam@example.com", "secret123", Some("Super-admin"))
        .await
        .unwrap();
    let state = create_test_app_state(config, pool.clone());

    let detail = state
        .product_service
        .create(seller, product_input("Desk Lamp", vec![png("side.png"), png("top.png")]))
        .await
        .unwrap();

    assert_eq!(detail.product.seller_id, seller);
    assert_eq!(detail.product.sell_price, Decimal::from_str("19.99").unwrap());
    let main = detail.product.image_url.clone().unwrap();
    assert!(main.starts_with("uploads/products/"));
    assert!(on_disk(&uploads, &main).exists());

    assert_eq!(detail.images.len(), 2);
    for image in &detail.images {
        assert_eq!(image.product_id, detail.product.id);
        assert!(on_disk(&uploads, &image.image_url).exists());
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_images WHERE product_id = $1")
        .bind(detail.product.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_product_create_removes_files_when_insert_fails() {
    let config = create_test_config();
    let products_dir = Path::new(&config.uploads.dir).join("products");
    let pool = setup_test_db(&config).await;
    let state = create_test_app_state(config, pool.clone());

    let before = files_in(&products_dir);

    // 卖家不存在，外键约束使插入失败
    let result = state
        .product_service
        .create(999_999, product_input("Ghost Lamp", vec![png("side.png")]))
        .await;
    assert!(result.is_err());

    assert_eq!(files_in(&products_dir), before);

    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(products, 0);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_product_update_replaces_main_image() {
    let config = create_test_config();
    let uploads = config.uploads.dir.clone();
    let pool = setup_test_db(&config).await;
    let seller = create_test_user(&pool, "Sam", "sam@example.com", "secret123", Some("Super-admin"))
        .await
        .unwrap();
    let state = create_test_app_state(config, pool);

    let created = state
        .product_service
        .create(seller, product_input("Desk Lamp", vec![]))
        .await
        .unwrap();
    let old_main = created.product.image_url.clone().unwrap();

    // 不带新图时保留原图
    let renamed = state
        .product_service
        .update(
            created.product.id,
            UpdateProductInput {
                name: Some("Reading Lamp".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.product.name, "Reading Lamp");
    assert_eq!(renamed.product.image_url.as_deref(), Some(old_main.as_str()));
    assert!(on_disk(&uploads, &old_main).exists());

    let updated = state
        .product_service
        .update(
            created.product.id,
            UpdateProductInput {
                sell_price: Some(Decimal::from_str("15.00").unwrap()),
                stock: Some(9),
                main_image: Some(png("new-main.png")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let new_main = updated.product.image_url.clone().unwrap();
    assert_ne!(new_main, old_main);
    assert_eq!(updated.product.sell_price, Decimal::from_str("15.00").unwrap());
    assert_eq!(updated.product.stock, 9);
    assert!(on_disk(&uploads, &new_main).exists());
    assert!(!on_disk(&uploads, &old_main).exists());

    let error = state
        .product_service
        .update(999_999, UpdateProductInput::default())
        .await
        .unwrap_err();
    assert_eq!(error.code(), 404);
}

#[tokio::test]
#[ignore] // 需要数据库
#[serial]
async fn test_product_add_images_and_delete() {
    let config = create_test_config();
    let uploads = config.uploads.dir.clone();
    let pool = setup_test_db(&config).await;
    let seller = create_test_user(&pool, "Sam", "sam@example.com", "secret123", Some("Super-admin"))
        .await
        .unwrap();
    let state = create_test_app_state(config, pool);
    let products = &state.product_service;

    let created = products
        .create(seller, product_input("Desk Lamp", vec![png("side.png")]))
        .await
        .unwrap();
    let id = created.product.id;

    let added = products
        .add_images(id, vec![png("back.png"), png("box.png")])
        .await
        .unwrap();
    assert_eq!(added.len(), 2);
    assert!(added.iter().all(|image| image.product_id == id));

    let detail = products.get(id).await.unwrap();
    assert_eq!(detail.images.len(), 3);
    assert_eq!(detail.seller.map(|s| s.id), Some(seller));

    let error = products.add_images(999_999, vec![png("x.png")]).await.unwrap_err();
    assert_eq!(error.code(), 404);

    let mut stored: Vec<String> = detail.images.iter().map(|i| i.image_url.clone()).collect();
    stored.push(created.product.image_url.clone().unwrap());

    products.delete(id).await.unwrap();

    for path in &stored {
        assert!(!on_disk(&uploads, path).exists(), "{} should be removed", path);
    }
    assert_eq!(products.get(id).await.unwrap_err().code(), 404);
    assert_eq!(products.delete(id).await.unwrap_err().code(), 404);
}
