//! Page arithmetic for dashboard listings.

use crate::response::PageMeta;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u32,
}

impl Page {
    pub fn meta(&self, page_size: u32) -> PageMeta {
        PageMeta {
            page: self.page,
            page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// 1-based page from a raw query value; missing, unparsable or < 1 becomes 1.
pub fn clamp_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, u32::MAX as i64) as u32)
        .unwrap_or(1)
}

/// Saturates, so absurd pages land past the end and come back empty.
pub fn offset_for(page: u32, page_size: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(page_size)
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some("0")), 1);
        assert_eq!(clamp_page(Some("-4")), 1);
        assert_eq!(clamp_page(Some("abc")), 1);
        assert_eq!(clamp_page(Some("3")), 3);
    }

    #[test]
    fn offsets() {
        assert_eq!(offset_for(1, 6), 0);
        assert_eq!(offset_for(3, 6), 12);
        assert_eq!(offset_for(u32::MAX, 6), u32::MAX);
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 6), 0);
        assert_eq!(total_pages(1, 6), 1);
        assert_eq!(total_pages(6, 6), 1);
        assert_eq!(total_pages(7, 6), 2);
        assert_eq!(total_pages(13, 6), 3);
    }
}
