use std::collections::BTreeMap;

use crate::models::agenda_item::filter::{
    keys, non_blank, parse_date_bound, parse_page, FilterState, ALL, SENTINEL_KEYS,
};
use crate::models::agenda_item::ItemStatus;

/// URL query parameters of the listing screen. This is the only place filter
/// state lives; [`FilterState`] is decoded from it on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    params: BTreeMap<String, String>,
}

fn is_unset(key: &str, value: &str) -> bool {
    value.trim().is_empty() || (SENTINEL_KEYS.contains(&key) && value == ALL)
}

impl QueryState {
    /// Parse a raw query string (without the leading `?`). Malformed input
    /// yields an empty state; a repeated key keeps its last value.
    pub fn parse(query: &str) -> Self {
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Ignoring malformed agenda query string: {e}");
                vec![]
            }
        };
        QueryState { params: pairs.into_iter().collect() }
    }

    /// Normalized value: `None` when missing, blank, or the `all` sentinel.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !is_unset(key, v))
    }

    pub fn read(&self, key: &str, fallback: &str) -> String {
        self.get(key).unwrap_or(fallback).to_string()
    }

    /// Merge `patch`; `None` (or a blank/sentinel value) deletes the key.
    /// Touching anything other than `page` resets pagination.
    pub fn update(&mut self, patch: &[(&str, Option<&str>)]) {
        let mut resets_page = false;
        for &(key, value) in patch {
            if key != keys::PAGE {
                resets_page = true;
            }
            match value.filter(|v| !is_unset(key, v)) {
                Some(v) => {
                    self.params.insert(key.to_string(), v.to_string());
                }
                None => {
                    self.params.remove(key);
                }
            }
        }
        if resets_page {
            self.params.remove(keys::PAGE);
        }
    }

    /// Copy pointing at another page, all filters kept.
    pub fn with_page(&self, page: i64) -> QueryState {
        let mut next = self.clone();
        if page <= 1 {
            next.update(&[(keys::PAGE, None)]);
        } else {
            let p = page.to_string();
            next.update(&[(keys::PAGE, Some(p.as_str()))]);
        }
        next
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(&self.params).unwrap_or_default()
    }

    /// `path` with this state's query string appended, if any.
    pub fn href(&self, path: &str) -> String {
        let qs = self.to_query_string();
        if qs.is_empty() { path.to_string() } else { format!("{path}?{qs}") }
    }

    pub fn filters(&self) -> FilterState {
        let status = self.get(keys::STATUS).and_then(|s| {
            let parsed = ItemStatus::parse(s);
            if parsed.is_none() {
                log::warn!("Ignoring unknown status filter '{s}'");
            }
            parsed
        });
        FilterState {
            search: self.get(keys::SEARCH).and_then(non_blank),
            status,
            visibility: self.get(keys::VISIBILITY).and_then(non_blank),
            city: self.get(keys::CITY).and_then(non_blank),
            date_start: self.date_param(keys::DATE_START),
            date_end: self.date_param(keys::DATE_END),
            page: self.get(keys::PAGE).map(parse_page).unwrap_or(1),
        }
    }

    fn date_param(&self, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = self.get(key)?;
        let parsed = parse_date_bound(raw);
        if parsed.is_none() {
            log::warn!("Ignoring unparseable {key} filter '{raw}'");
        }
        parsed
    }
}
