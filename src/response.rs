//! Response helpers: dashboard envelope (`{data, meta}`) and bare public payloads.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

#[derive(Serialize)]
pub struct SuccessPage<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination metadata for dashboard listings.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data, meta: None }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, meta: None }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

pub fn success_page<T: Serialize>(data: Vec<T>, meta: PageMeta) -> (StatusCode, Json<SuccessPage<T>>) {
    (StatusCode::OK, Json(SuccessPage { data, meta }))
}

/// Bare JSON for the public site, with an optional shared-cache lifetime.
/// `max_age` of 0 sends no Cache-Control header.
pub fn public_json<T: Serialize>(data: T, max_age: u32) -> Response {
    let mut resp = Json(data).into_response();
    if max_age > 0 {
        let value = format!("public, s-maxage={}, stale-while-revalidate={}", max_age, max_age * 2);
        if let Ok(v) = HeaderValue::from_str(&value) {
            resp.headers_mut().insert(header::CACHE_CONTROL, v);
        }
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_json_sets_cache_control() {
        let resp = public_json(serde_json::json!([]), 300);
        let cc = resp.headers().get(header::CACHE_CONTROL).unwrap();
        assert_eq!(cc, "public, s-maxage=300, stale-while-revalidate=600");
    }

    #[test]
    fn public_json_without_cache() {
        let resp = public_json(serde_json::json!({"ok": true}), 0);
        assert!(resp.headers().get(header::CACHE_CONTROL).is_none());
    }
}
