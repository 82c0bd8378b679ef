use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use super::{ListingQuery, Page, RecordStore, StoreError};
use crate::models::agenda_item::{AgendaItem, ItemId, ItemStatus, NewAgendaItem};

/// Process-local store with the same semantics as the Postgres store.
/// Failures can be switched on to exercise error paths.
#[derive(Default)]
pub struct InMemoryStore {
    rows: RwLock<Vec<AgendaItem>>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing rows (ids are kept as given).
    pub fn with_items(items: Vec<AgendaItem>) -> Self {
        let max_id = items.iter().map(|i| i.id).max().unwrap_or(0);
        InMemoryStore {
            rows: RwLock::new(items),
            next_id: AtomicI64::new(max_id),
            ..Default::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw row by id, including soft-deleted ones.
    pub fn get_raw(&self, id: ItemId) -> Option<AgendaItem> {
        self.rows.read().ok()?.iter().find(|r| r.id == id).cloned()
    }

    /// Every row, including soft-deleted ones.
    pub fn all_raw(&self) -> Vec<AgendaItem> {
        self.rows.read().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("listing query failed".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mutation rejected".to_string()));
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list(&self, query: &ListingQuery) -> Result<Page, StoreError> {
        self.check_reads()?;
        let rows = self.rows.read().map_err(poisoned)?;
        let mut matching: Vec<&AgendaItem> = rows.iter().filter(|r| query.matches(r)).collect();
        matching.sort_by_key(|r| Reverse((r.updated_at, r.id)));
        let total_count = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(Page { rows: page, total_count })
    }

    async fn find(&self, id: ItemId) -> Result<Option<AgendaItem>, StoreError> {
        self.check_reads()?;
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.iter().find(|r| r.id == id && r.deleted_at.is_none()).cloned())
    }

    async fn set_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<u64, StoreError> {
        self.check_writes()?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        let now = Utc::now();
        let mut touched = 0;
        for row in rows.iter_mut().filter(|r| ids.contains(&r.id) && r.deleted_at.is_none()) {
            row.status = status;
            row.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn soft_delete(&self, id: ItemId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .ok_or(StoreError::NotFound)?;
        row.deleted_at = Some(at);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn insert(&self, item: &NewAgendaItem) -> Result<AgendaItem, StoreError> {
        self.check_writes()?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        if rows.iter().any(|r| r.slug == item.slug && r.deleted_at.is_none()) {
            return Err(StoreError::Unavailable(format!("slug '{}' already in use", item.slug)));
        }
        let created = AgendaItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: item.title.clone(),
            slug: item.slug.clone(),
            city: item.city.clone(),
            start_at: item.start_at,
            end_at: item.end_at,
            visibility_type: item.visibility_type.clone(),
            status: item.status,
            updated_at: Utc::now(),
            cover_url: item.cover_url.clone(),
            alt_text: item.alt_text.clone(),
            deleted_at: None,
        };
        rows.push(created.clone());
        Ok(created)
    }
}
