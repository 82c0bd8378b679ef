//! Record store abstraction for agenda items.
//!
//! The listing controller never talks to a database handle directly; it is
//! handed an `Arc<dyn RecordStore>`. Production wiring uses [`PgRecordStore`],
//! tests and `--memory` runs use [`InMemoryStore`].

pub mod builder;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::models::agenda_item::{AgendaItem, FilterState, ItemId, ItemStatus, NewAgendaItem};

pub use memory::InMemoryStore;
pub use postgres::PgRecordStore;

pub type SharedStore = Arc<dyn RecordStore>;

#[derive(Debug)]
pub enum StoreError {
    Db(sqlx::Error),
    NotFound,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(e) => write!(f, "Database error: {e}"),
            StoreError::NotFound => write!(f, "Agenda item not found"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Db(other),
        }
    }
}

/// Fully resolved listing query: filters plus offset/limit. Soft-deleted rows
/// are always excluded and rows are ordered by `updated_at` descending.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub status: Option<ItemStatus>,
    pub visibility: Option<String>,
    pub city: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub offset: i64,
    pub limit: i64,
}

impl ListingQuery {
    pub fn from_filters(filters: &FilterState, page_size: i64) -> Self {
        ListingQuery {
            search: filters.search.clone(),
            status: filters.status,
            visibility: filters.visibility.clone(),
            city: filters.city.clone(),
            date_start: filters.date_start,
            date_end: filters.date_end,
            offset: filters.offset(page_size),
            limit: page_size,
        }
    }

    /// Row predicate equivalent to the SQL built by [`builder::build_where_clause`].
    pub fn matches(&self, item: &AgendaItem) -> bool {
        if item.deleted_at.is_some() {
            return false;
        }
        if let Some(q) = &self.search {
            let needle = q.to_lowercase();
            if !item.title.to_lowercase().contains(&needle)
                && !item.slug.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if self.visibility.as_ref().is_some_and(|v| *v != item.visibility_type) {
            return false;
        }
        if self.city.as_ref().is_some_and(|c| item.city.as_ref() != Some(c)) {
            return false;
        }
        if self.date_start.is_some_and(|d| item.start_at < d) {
            return false;
        }
        if self.date_end.is_some_and(|d| item.end_at > d) {
            return false;
        }
        true
    }
}

/// One page of rows plus the exact number of matching rows.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub rows: Vec<AgendaItem>,
    pub total_count: i64,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Filtered, counted, paginated listing of non-deleted items.
    async fn list(&self, query: &ListingQuery) -> Result<Page, StoreError>;

    /// Single non-deleted item by id.
    async fn find(&self, id: ItemId) -> Result<Option<AgendaItem>, StoreError>;

    /// Set `status` on every non-deleted id in one batch. Returns rows touched.
    async fn set_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<u64, StoreError>;

    /// Soft delete. `NotFound` when the row is missing or already deleted.
    async fn soft_delete(&self, id: ItemId, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn insert(&self, item: &NewAgendaItem) -> Result<AgendaItem, StoreError>;
}
