//! 分页工具
//! 解析 `?page=&limit=`，并生成带翻页链接的分页元数据

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// 页码上限，保证 `(page - 1) * limit` 不溢出
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// 页码链接窗口大小
const PAGE_RANGE: i64 = 10;

/// 分页查询参数
///
/// 参数以字符串接收，非法值回落到默认值而不是直接拒绝请求。
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(MAX_PAGE))
            .unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub page: i64,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
    pub links: PaginationLinks,
}

fn page_url(base_url: &str, page: i64, limit: i64) -> String {
    format!("{}?page={}&limit={}", base_url, page, limit)
}

/// 生成分页元数据
pub fn paginate(page: i64, limit: i64, total: i64, base_url: &str) -> Pagination {
    let limit = limit.max(1);
    let total = total.max(0);
    let total_pages = total / limit + i64::from(total % limit != 0);

    let next_page = (page < total_pages).then(|| page.saturating_add(1));
    let prev_page = (page > 1).then(|| page.saturating_sub(1));

    let start_page = page.saturating_sub(PAGE_RANGE / 2).max(1);
    let end_page = total_pages.min(start_page.saturating_add(PAGE_RANGE - 1));

    let pages = (start_page..=end_page)
        .map(|i| PageLink {
            page: i,
            url: page_url(base_url, i, limit),
            active: i == page,
        })
        .collect();

    Pagination {
        total,
        per_page: limit,
        current_page: page,
        total_pages,
        next_page,
        prev_page,
        links: PaginationLinks {
            first: page_url(base_url, 1, limit),
            last: page_url(base_url, total_pages.max(1), limit),
            prev: prev_page.map(|p| page_url(base_url, p, limit)),
            next: next_page.map(|p| page_url(base_url, p, limit)),
            pages,
        },
    }
}

/// 从请求头推导资源的绝对 URL
pub fn base_url(headers: &HeaderMap, path: &str) -> String {
    let protocol = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "http".to_string());
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}{}", protocol, host, path)
}
