//! Gallery images attached to projects, events, products and machines.

use crate::config::ParentType;
use crate::error::AppError;
use crate::service::CrudService;
use crate::sql::{delete_galleries, insert_gallery, select_galleries};
use serde::Deserialize;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const URL_PREFIX: &str = "gallery_url_";
const ALT_PREFIX: &str = "gallery_alt_";
const ORDER_PREFIX: &str = "gallery_order_";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub order_index: Option<i32>,
}

impl GalleryImage {
    pub fn new(image_url: &str, alt_text: &str) -> Self {
        GalleryImage {
            image_url: image_url.to_string(),
            alt_text: alt_text.to_string(),
            order_index: None,
        }
    }
}

/// Sort by submitted order (position when absent), drop blank and repeated URLs
/// (first wins) and renumber `1..n`.
pub fn normalize(images: Vec<GalleryImage>) -> Vec<GalleryImage> {
    let mut indexed: Vec<(i64, GalleryImage)> = images
        .into_iter()
        .enumerate()
        .map(|(pos, img)| (img.order_index.map(i64::from).unwrap_or(pos as i64 + 1), img))
        .collect();
    indexed.sort_by_key(|(order, _)| *order);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (_, mut img) in indexed {
        img.image_url = img.image_url.trim().to_string();
        if img.image_url.is_empty() || !seen.insert(img.image_url.clone()) {
            continue;
        }
        img.order_index = Some(out.len() as i32 + 1);
        out.push(img);
    }
    out
}

/// Split `gallery_url_N` / `gallery_alt_N` / `gallery_order_N` fields (and a main
/// `image_url` / `alt_text`, which leads the list) out of a submitted form.
/// Returns the images and the remaining fields.
pub fn split_form(mut fields: HashMap<String, String>) -> (Vec<GalleryImage>, HashMap<String, String>) {
    let mut images = Vec::new();
    if let Some(main) = fields.remove("image_url").filter(|u| !u.trim().is_empty()) {
        let alt = fields.remove("alt_text").unwrap_or_default();
        images.push(GalleryImage {
            image_url: main,
            alt_text: alt,
            order_index: Some(0),
        });
    } else {
        fields.remove("alt_text");
    }

    let mut slots: Vec<u32> = fields
        .keys()
        .filter_map(|k| k.strip_prefix(URL_PREFIX))
        .filter_map(|n| n.parse().ok())
        .collect();
    slots.sort_unstable();
    slots.dedup();

    for n in slots {
        let url = fields.remove(&format!("{}{}", URL_PREFIX, n)).unwrap_or_default();
        let alt = fields.remove(&format!("{}{}", ALT_PREFIX, n)).unwrap_or_default();
        let order = fields
            .remove(&format!("{}{}", ORDER_PREFIX, n))
            .and_then(|o| o.trim().parse::<i32>().ok());
        if url.trim().is_empty() {
            continue;
        }
        images.push(GalleryImage {
            image_url: url,
            alt_text: alt,
            order_index: order,
        });
    }
    fields.retain(|k, _| !k.starts_with(ALT_PREFIX) && !k.starts_with(ORDER_PREFIX) && !k.starts_with(URL_PREFIX));
    (images, fields)
}

pub struct GalleryService;

impl GalleryService {
    pub async fn list(pool: &PgPool, parent_id: Uuid, parent: ParentType) -> Result<Vec<Value>, AppError> {
        CrudService::query_many(pool, &select_galleries(parent_id, parent)).await
    }

    /// Replace the whole gallery of one parent atomically.
    pub async fn replace(
        pool: &PgPool,
        parent_id: Uuid,
        parent: ParentType,
        images: Vec<GalleryImage>,
    ) -> Result<Vec<Value>, AppError> {
        let mut tx = pool.begin().await?;
        let rows = Self::replace_in(&mut tx, parent_id, parent, images).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Replace within a caller-owned transaction; returns the new rows.
    pub async fn replace_in(
        conn: &mut PgConnection,
        parent_id: Uuid,
        parent: ParentType,
        images: Vec<GalleryImage>,
    ) -> Result<Vec<Value>, AppError> {
        let removed = CrudService::query_many_in(conn, &delete_galleries(parent_id, parent)).await?;
        let images = normalize(images);
        let mut rows = Vec::with_capacity(images.len());
        for img in &images {
            let q = insert_gallery(parent_id, parent, &img.image_url, &img.alt_text, img.order_index.unwrap_or(0));
            if let Some(row) = CrudService::query_one_in(conn, &q).await? {
                rows.push(row);
            }
        }
        tracing::info!(%parent_id, parent_type = parent.as_i16(), removed = removed.len(), inserted = rows.len(), "gallery replaced");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn normalize_dedupes_and_renumbers() {
        let out = normalize(vec![
            GalleryImage::new("/a.jpg", "first"),
            GalleryImage::new("/b.jpg", ""),
            GalleryImage::new("/a.jpg", "dup"),
            GalleryImage::new("  ", ""),
            GalleryImage::new("/c.jpg", ""),
        ]);
        let urls: Vec<&str> = out.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["/a.jpg", "/b.jpg", "/c.jpg"]);
        assert_eq!(out[0].alt_text, "first");
        let orders: Vec<i32> = out.iter().map(|i| i.order_index.unwrap()).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn normalize_honours_submitted_order() {
        let mut a = GalleryImage::new("/a.jpg", "");
        a.order_index = Some(2);
        let mut b = GalleryImage::new("/b.jpg", "");
        b.order_index = Some(1);
        let out = normalize(vec![a, b]);
        assert_eq!(out[0].image_url, "/b.jpg");
        assert_eq!(out[1].order_index, Some(2));
    }

    #[test]
    fn split_form_extracts_gallery_fields() {
        let (images, rest) = split_form(form(&[
            ("title_en", "Tower"),
            ("image_url", "/main.jpg"),
            ("alt_text", "front"),
            ("gallery_url_0", "/g0.jpg"),
            ("gallery_alt_0", "side"),
            ("gallery_order_0", "1"),
            ("gallery_url_10", "/g10.jpg"),
            ("gallery_url_2", ""),
            ("gallery_alt_2", "orphan"),
        ]));
        let urls: Vec<&str> = images.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["/main.jpg", "/g0.jpg", "/g10.jpg"]);
        assert_eq!(images[1].alt_text, "side");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest["title_en"], "Tower");

        let normalized = normalize(images);
        assert_eq!(normalized[0].image_url, "/main.jpg");
    }

    #[test]
    fn split_form_without_gallery_fields() {
        let (images, rest) = split_form(form(&[("title_en", "Tower"), ("image_url", "")]));
        assert!(images.is_empty());
        assert!(!rest.contains_key("image_url"));
    }
}
