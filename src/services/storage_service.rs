//! 上传文件存储
//!
//! 文件落在 `<uploads.dir>/<resource>/<毫秒时间戳>-<随机数>.<ext>`，
//! 数据库中保存 `uploads/<resource>/<文件名>` 形式的相对路径，并通过 `/uploads` 对外提供。

use axum::body::Bytes;
use rand::Rng;
use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

/// 数据库中保存的路径前缀，同时也是静态文件路由
pub const PUBLIC_PREFIX: &str = "uploads";

/// multipart 中读取到的文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime(&self) -> &str {
        self.content_type.as_deref().unwrap_or("application/octet-stream")
    }

    /// 扩展名只由 MIME 决定，客户端文件名不参与
    fn extension(&self) -> Option<&'static str> {
        match self.mime() {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }
}

/// 本地磁盘存储
#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 写入文件，返回入库用的相对路径
    pub async fn save(&self, resource: &str, file: &UploadedFile) -> Result<String, AppError> {
        let dir = self.root.join(resource);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!(dir = %dir.display(), "Failed to create upload directory: {}", e);
            AppError::internal_error("File upload failed")
        })?;

        let file_name = unique_file_name(file.extension());
        let target = dir.join(&file_name);

        tokio::fs::write(&target, &file.bytes).await.map_err(|e| {
            tracing::error!(path = %target.display(), "Failed to write upload: {}", e);
            AppError::internal_error("File upload failed")
        })?;

        metrics::counter!("uploads_stored_total", "resource" => resource.to_string()).increment(1);
        tracing::debug!(path = %target.display(), size = file.size(), "Upload stored");

        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, resource, file_name))
    }

    /// 删除已保存的文件；文件不存在不算错误，其他失败只记录日志
    pub async fn delete(&self, stored_path: &str) {
        let Some(path) = self.resolve(stored_path) else {
            tracing::warn!(path = %stored_path, "Refusing to delete path outside upload directory");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Upload deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "Failed to delete upload: {}", e),
        }
    }

    pub async fn delete_all<I, S>(&self, stored_paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in stored_paths {
            self.delete(path.as_ref()).await;
        }
    }

    /// 相对路径映射回磁盘路径，拒绝越界路径
    fn resolve(&self, stored_path: &str) -> Option<PathBuf> {
        let relative = stored_path
            .trim_start_matches('/')
            .strip_prefix(PUBLIC_PREFIX)?
            .strip_prefix('/')?;

        let relative = Path::new(relative);
        let is_safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        (is_safe && relative.components().next().is_some()).then(|| self.root.join(relative))
    }
}

fn unique_file_name(extension: Option<&str>) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    match extension {
        Some(ext) => format!("{}-{}.{}", millis, random, ext),
        None => format!("{}-{}", millis, random),
    }
}
