//! multipart 表单读取
//! 把整个表单读入内存，文本字段与文件分开存放，供业务层按字段校验

use axum::extract::{FromRequest, Multipart, Request};
use std::collections::HashMap;

use crate::{error::AppError, services::storage_service::UploadedFile};

/// 已读取的 multipart 表单
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(e.body_text())
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;

                    // 浏览器对未选择文件的字段也会发送空的文件部分
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    form.files.push(UploadedFile {
                        field: name,
                        file_name: Some(file_name).filter(|n| !n.is_empty()),
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// 文本字段（原样，不做 trim）
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// 文本字段，空白视为未提供
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).filter(|v| !v.trim().is_empty())
    }

    /// 取出指定字段的所有文件
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == name);
        self.files = rest;
        taken
    }

    /// 取出指定字段的第一个文件
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.take_files(name).into_iter().next()
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("Multipart rejected: {}", rejection.body_text());
            AppError::BadRequest(rejection.body_text())
        })?;

        MultipartForm::read(multipart).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;

    pub const BOUNDARY: &str = "X-SHOP-BOUNDARY";

    /// 构造 multipart 请求体：`(字段名, 文件名, MIME, 内容)`，文件名为 None 时是文本字段
    pub fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
                ),
            }
            if let Some(content_type) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn request(body: Vec<u8>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_fields_and_files() {
        let body = multipart_body(&[
            ("name", None, None, b"Shoes"),
            ("mainImage", Some("a.png"), Some("image/png"), b"png-bytes"),
            ("featureImages", Some("b.jpg"), Some("image/jpeg"), b"jpg-1"),
            ("featureImages", Some("c.jpg"), Some("image/jpeg"), b"jpg-2"),
            ("image", Some(""), Some("application/octet-stream"), b""),
        ]);

        let mut form = MultipartForm::from_request(request(body), &()).await.unwrap();
        assert_eq!(form.text("name"), Some("Shoes"));
        assert_eq!(form.non_blank("missing"), None);

        let main = form.take_file("mainImage").unwrap();
        assert_eq!(main.mime(), "image/png");
        assert_eq!(main.size(), 9);

        assert_eq!(form.take_files("featureImages").len(), 2);
        // 空文件部分被忽略
        assert!(form.take_file("image").is_none());
    }

    #[tokio::test]
    async fn test_non_multipart_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = MultipartForm::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.code(), 400);
    }
}
