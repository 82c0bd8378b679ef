//! Shared test infrastructure for listing and HTTP tests.
//!
//! - `sample_item()` / `seeded_store()` - in-memory rows with predictable ordering
//! - `RecordingNotifier` - captures notifications for assertions
//! - `GatedStore` - holds back listings for one search term (or lookups of one
//!   id) until released, and counts listing queries

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use agenda_admin::listing::{AgendaController, ListingSettings};
use agenda_admin::models::agenda_item::{AgendaItem, ItemId, ItemStatus, NewAgendaItem};
use agenda_admin::notify::{Notification, Notifier};
use agenda_admin::store::{InMemoryStore, ListingQuery, Page, RecordStore, StoreError};

// ============================================================================
// FIXTURES
// ============================================================================

pub const PAGE_SIZE: i64 = 5;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Published row whose `updated_at` grows with `id`, so higher ids list first.
pub fn sample_item(id: ItemId, title: &str) -> AgendaItem {
    let slug = title.to_lowercase().replace(' ', "-");
    AgendaItem {
        id,
        title: title.to_string(),
        slug,
        city: Some("lisbon".to_string()),
        start_at: Utc.with_ymd_and_hms(2030, 6, 1, 20, 0, 0).unwrap(),
        end_at: Utc.with_ymd_and_hms(2030, 6, 1, 23, 0, 0).unwrap(),
        visibility_type: "public".to_string(),
        status: ItemStatus::Published,
        updated_at: base_time() + Duration::minutes(id),
        cover_url: Some(format!("https://cdn.example/{id}.jpg")),
        alt_text: Some(format!("Cover for {title}")),
        deleted_at: None,
    }
}

/// Three published rows in lisbon plus two drafts in porto.
pub fn seeded_items() -> Vec<AgendaItem> {
    let mut items = vec![
        sample_item(1, "Jazz Night"),
        sample_item(2, "Poetry Slam"),
        sample_item(3, "Street Market"),
        sample_item(4, "Film Club"),
        sample_item(5, "Jazz Brunch"),
    ];
    for item in items.iter_mut().filter(|i| i.id >= 4) {
        item.status = ItemStatus::Draft;
        item.city = Some("porto".to_string());
    }
    items
}

pub fn seeded_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_items(seeded_items()))
}

pub fn settings() -> ListingSettings {
    ListingSettings {
        page_size: PAGE_SIZE,
        public_base_url: "https://agenda.example".to_string(),
        ..ListingSettings::default()
    }
}

// ============================================================================
// NOTIFIER
// ============================================================================

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub fn controller(
    store: Arc<InMemoryStore>,
) -> (AgendaController<InMemoryStore, RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    (AgendaController::new(store, notifier.clone(), settings()), notifier)
}

// ============================================================================
// GATED STORE
// ============================================================================

/// Listings whose search equals `gated_search`, and finds of `gated_find`,
/// wait for `release()`.
pub struct GatedStore {
    pub inner: InMemoryStore,
    gated_search: String,
    gated_find: Option<ItemId>,
    entered: Notify,
    gate: Notify,
    lists: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: InMemoryStore, gated_search: &str) -> Self {
        GatedStore {
            inner,
            gated_search: gated_search.to_string(),
            gated_find: None,
            entered: Notify::new(),
            gate: Notify::new(),
            lists: AtomicUsize::new(0),
        }
    }

    pub fn gate_find(mut self, id: ItemId) -> Self {
        self.gated_find = Some(id);
        self
    }

    /// Number of listing queries served so far.
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    async fn hold(&self) {
        self.entered.notify_one();
        self.gate.notified().await;
    }

    /// Resolves once a gated listing is parked on the gate.
    pub async fn wait_until_blocked(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn list(&self, query: &ListingQuery) -> Result<Page, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if query.search.as_deref() == Some(self.gated_search.as_str()) {
            self.hold().await;
        }
        self.inner.list(query).await
    }

    async fn find(&self, id: ItemId) -> Result<Option<AgendaItem>, StoreError> {
        if self.gated_find == Some(id) {
            self.hold().await;
        }
        self.inner.find(id).await
    }

    async fn set_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<u64, StoreError> {
        self.inner.set_status(ids, status).await
    }

    async fn soft_delete(&self, id: ItemId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.soft_delete(id, at).await
    }

    async fn insert(&self, item: &NewAgendaItem) -> Result<AgendaItem, StoreError> {
        self.inner.insert(item).await
    }
}
