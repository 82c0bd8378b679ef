// src/models/agenda_item/filter.rs
use chrono::{DateTime, NaiveDate, Utc};

use super::types::ItemStatus;

/// Query-string keys owned by the agenda listing.
pub mod keys {
    pub const SEARCH: &str = "search";
    pub const STATUS: &str = "status";
    pub const VISIBILITY: &str = "visibility";
    pub const CITY: &str = "city";
    pub const DATE_START: &str = "dateStart";
    pub const DATE_END: &str = "dateEnd";
    pub const PAGE: &str = "page";
}

/// Select-style filters where the literal `all` means "no constraint".
pub const SENTINEL_KEYS: &[&str] = &[keys::STATUS, keys::VISIBILITY, keys::CITY];

pub const ALL: &str = "all";

/// Typed view of the listing filters. Always rebuilt from the URL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub search: Option<String>,
    pub status: Option<ItemStatus>,
    pub visibility: Option<String>,
    pub city: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub page: i64,
}

impl FilterState {
    pub fn first_page() -> Self {
        FilterState { page: 1, ..Default::default() }
    }

    /// Row offset of this page. Saturates for absurd page numbers, which
    /// then simply select an empty page.
    pub fn offset(&self, page_size: i64) -> i64 {
        (self.page.max(1) - 1).saturating_mul(page_size.max(0))
    }
}

/// `None` for blank input, otherwise the trimmed value.
pub fn non_blank(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date_bound(value: &str) -> Option<DateTime<Utc>> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(v) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// 1-based page number; anything unparseable or below 1 is page 1.
pub fn parse_page(value: &str) -> i64 {
    value.trim().parse::<i64>().ok().filter(|p| *p >= 1).unwrap_or(1)
}

pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total_count <= 0 {
        return 1;
    }
    (total_count + page_size - 1) / page_size
}
