use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::actions::{
    ActionError, ActionOutcome, BulkAction, InFlightGuard, InFlightKey, InFlightRegistry, RowAction,
};
use super::query_state::QueryState;
use super::selection::SelectionTracker;
use crate::models::agenda_item::filter::{keys, total_pages};
use crate::models::agenda_item::{slug_token, AgendaItem, FilterState, ItemId, ItemStatus, NewAgendaItem};
use crate::notify::{Notification, Notifier};
use crate::store::{ListingQuery, Page, RecordStore, StoreError};

/// Knobs for one listing screen.
#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub page_size: i64,
    /// Admin path of the listing; edit screens live below it.
    pub admin_path: String,
    /// Origin of the public site, used by the "view" action.
    pub public_base_url: String,
}

impl Default for ListingSettings {
    fn default() -> Self {
        ListingSettings {
            page_size: 20,
            admin_path: "/admin/agenda".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl ListingSettings {
    pub fn edit_path(&self, id: ItemId) -> String {
        format!("{}/{id}/edit", self.admin_path.trim_end_matches('/'))
    }

    pub fn public_url(&self, slug: &str) -> String {
        format!("{}/agenda/{slug}", self.public_base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Point-in-time copy of what the listing shows.
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    pub status: FetchStatus,
    pub rows: Vec<AgendaItem>,
    pub total_count: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl ListingSnapshot {
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// Fetch succeeded and matched nothing.
    pub fn is_empty_result(&self) -> bool {
        self.status == FetchStatus::Ready && self.rows.is_empty()
    }
}

/// Store-side effect of a mutating row action.
#[derive(Debug, Clone, Copy)]
enum RowMutation {
    SetStatus(ItemStatus),
    Duplicate,
    SoftDelete,
}

struct ListingState {
    status: FetchStatus,
    rows: Vec<AgendaItem>,
    total_count: i64,
    page: i64,
}

/// Agenda listing controller: URL-backed filters, generation-guarded fetches,
/// row selection and action dispatch over an injected [`RecordStore`].
///
/// All methods take `&self`; several fetches may be in flight at once and
/// only the most recently issued one is applied.
pub struct AgendaController<S: RecordStore + ?Sized, N: Notifier> {
    store: Arc<S>,
    notifier: N,
    settings: ListingSettings,
    query: Mutex<QueryState>,
    issued: AtomicU64,
    listing: Mutex<ListingState>,
    selection: Mutex<SelectionTracker>,
    in_flight: InFlightRegistry,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: RecordStore + ?Sized, N: Notifier> AgendaController<S, N> {
    pub fn new(store: Arc<S>, notifier: N, settings: ListingSettings) -> Self {
        AgendaController {
            store,
            notifier,
            settings,
            query: Mutex::new(QueryState::default()),
            issued: AtomicU64::new(0),
            listing: Mutex::new(ListingState {
                status: FetchStatus::Idle,
                rows: vec![],
                total_count: 0,
                page: 1,
            }),
            selection: Mutex::new(SelectionTracker::new()),
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Start from an existing URL state (e.g. the request's query string).
    pub fn with_query(self, query: QueryState) -> Self {
        *lock(&self.query) = query;
        self
    }

    /// Share duplicate-submission tracking with other controllers.
    pub fn with_in_flight(mut self, registry: InFlightRegistry) -> Self {
        self.in_flight = registry;
        self
    }

    pub fn settings(&self) -> &ListingSettings {
        &self.settings
    }

    pub fn query(&self) -> QueryState {
        lock(&self.query).clone()
    }

    pub fn filters(&self) -> FilterState {
        lock(&self.query).filters()
    }

    /// Patch the URL state and refetch.
    pub async fn update_query(&self, patch: &[(&str, Option<&str>)]) -> ListingSnapshot {
        lock(&self.query).update(patch);
        self.refresh().await
    }

    pub async fn go_to_page(&self, page: i64) -> ListingSnapshot {
        let p = page.max(1).to_string();
        self.update_query(&[(keys::PAGE, Some(p.as_str()))]).await
    }

    /// Full refetch for the current URL state.
    pub async fn refresh(&self) -> ListingSnapshot {
        let filters = self.filters();
        let generation = {
            // Issue and mark loading under the listing lock.
            let mut listing = lock(&self.listing);
            listing.status = FetchStatus::Loading;
            self.issued.fetch_add(1, Ordering::SeqCst) + 1
        };

        let query = ListingQuery::from_filters(&filters, self.settings.page_size);
        let result = self.store.list(&query).await;
        self.finish_fetch(generation, filters.page, result)
    }

    fn finish_fetch(&self, generation: u64, page: i64, result: Result<Page, StoreError>) -> ListingSnapshot {
        let mut listing = lock(&self.listing);
        let latest = self.issued.load(Ordering::SeqCst);
        if generation != latest {
            log::warn!("Discarding agenda listing response {generation}, superseded by {latest}");
            return self.snapshot_of(&listing);
        }

        match result {
            Ok(fetched) => {
                let ids: Vec<ItemId> = fetched.rows.iter().map(|r| r.id).collect();
                listing.rows = fetched.rows;
                listing.total_count = fetched.total_count;
                listing.page = page;
                listing.status = FetchStatus::Ready;
                let dropped = lock(&self.selection).reconcile(&ids);
                if dropped > 0 {
                    log::warn!("Dropped {dropped} selected agenda item(s) no longer on the page");
                }
            }
            Err(e) => {
                log::error!("Agenda listing fetch failed: {e}");
                listing.status = FetchStatus::Failed(e.to_string());
            }
        }
        self.snapshot_of(&listing)
    }

    fn snapshot_of(&self, listing: &ListingState) -> ListingSnapshot {
        ListingSnapshot {
            status: listing.status.clone(),
            rows: listing.rows.clone(),
            total_count: listing.total_count,
            page: listing.page,
            total_pages: total_pages(listing.total_count, self.settings.page_size),
        }
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        let listing = lock(&self.listing);
        self.snapshot_of(&listing)
    }

    // --- selection ---

    pub fn toggle(&self, id: ItemId) {
        lock(&self.selection).toggle(id);
    }

    pub fn toggle_all(&self) {
        lock(&self.selection).toggle_all();
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        lock(&self.selection).is_selected(id)
    }

    pub fn all_selected(&self) -> bool {
        lock(&self.selection).all_selected()
    }

    pub fn clear_selection(&self) {
        lock(&self.selection).clear();
    }

    pub fn selection_count(&self) -> usize {
        lock(&self.selection).count()
    }

    pub fn selected_ids(&self) -> Vec<ItemId> {
        lock(&self.selection).selected_ids()
    }

    // --- actions ---

    fn claim(&self, key: InFlightKey) -> Result<InFlightGuard, ActionError> {
        self.in_flight.begin(key).inspect_err(|_| {
            self.notifier.notify(Notification::failure(
                "Action already running",
                "Wait for the previous submission to finish",
            ));
        })
    }

    /// Run a single-row action. Mutations refetch on success; on failure the
    /// user is notified and nothing local changes.
    pub async fn apply(&self, action: RowAction, id: ItemId) -> Result<ActionOutcome, ActionError> {
        let mutation = match action {
            RowAction::Edit => return Ok(ActionOutcome::Navigate(self.settings.edit_path(id))),
            RowAction::View => return self.public_link(id).await,
            RowAction::Publish => RowMutation::SetStatus(ItemStatus::Published),
            RowAction::Unpublish => RowMutation::SetStatus(ItemStatus::Draft),
            RowAction::Duplicate => RowMutation::Duplicate,
            RowAction::Delete => RowMutation::SoftDelete,
        };

        let _guard = self.claim(InFlightKey::Row(action, id))?;
        match self.mutate_row(mutation, id).await {
            Ok(outcome) => {
                log::info!("Agenda item {id}: {} succeeded", action.as_str());
                self.notifier.notify(success_notice(action, id, &outcome));
                self.refresh().await;
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Agenda item {id}: {} failed: {e}", action.as_str());
                self.notifier.notify(Notification::failure(
                    format!("Could not {} item", action.as_str()),
                    e.to_string(),
                ));
                Err(ActionError::Store(e))
            }
        }
    }

    async fn mutate_row(&self, mutation: RowMutation, id: ItemId) -> Result<ActionOutcome, StoreError> {
        match mutation {
            RowMutation::SetStatus(status) => self.set_one_status(id, status).await,
            RowMutation::Duplicate => {
                let source = self.store.find(id).await?.ok_or(StoreError::NotFound)?;
                let copy = NewAgendaItem::copy_of(&source, &slug_token());
                let created = self.store.insert(&copy).await?;
                Ok(ActionOutcome::Duplicated { new_id: created.id })
            }
            RowMutation::SoftDelete => {
                self.store.soft_delete(id, Utc::now()).await?;
                Ok(ActionOutcome::Updated { affected: 1 })
            }
        }
    }

    async fn set_one_status(&self, id: ItemId, status: ItemStatus) -> Result<ActionOutcome, StoreError> {
        match self.store.set_status(&[id], status).await? {
            0 => Err(StoreError::NotFound),
            affected => Ok(ActionOutcome::Updated { affected }),
        }
    }

    async fn public_link(&self, id: ItemId) -> Result<ActionOutcome, ActionError> {
        let on_page = lock(&self.listing)
            .rows
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.slug.clone());
        let slug = match on_page {
            Some(slug) => slug,
            None => match self.store.find(id).await {
                Ok(Some(item)) => item.slug,
                Ok(None) => return Err(self.report_failure("view", StoreError::NotFound)),
                Err(e) => return Err(self.report_failure("view", e)),
            },
        };
        Ok(ActionOutcome::OpenExternal(self.settings.public_url(&slug)))
    }

    fn report_failure(&self, verb: &str, e: StoreError) -> ActionError {
        log::error!("Agenda {verb} failed: {e}");
        self.notifier
            .notify(Notification::failure(format!("Could not {verb} item"), e.to_string()));
        ActionError::Store(e)
    }

    /// Apply a bulk action to the current selection in one batch. On success
    /// the selection is cleared and the listing refetched.
    pub async fn apply_bulk(&self, action: BulkAction) -> Result<ActionOutcome, ActionError> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            self.notifier.notify(Notification::failure(
                "Nothing selected",
                "Select at least one agenda item first",
            ));
            return Err(ActionError::NothingSelected);
        }

        let _guard = self.claim(InFlightKey::Bulk(action))?;
        match self.store.set_status(&ids, action.target_status()).await {
            Ok(affected) => {
                log::info!("Bulk {:?} applied to {affected}/{} agenda items", action, ids.len());
                self.clear_selection();
                self.notifier.notify(bulk_notice(action, affected, ids.len()));
                self.refresh().await;
                Ok(ActionOutcome::Updated { affected })
            }
            Err(e) => {
                log::error!("Bulk {:?} failed for {} agenda items: {e}", action, ids.len());
                self.notifier.notify(Notification::failure(
                    format!("Bulk {} failed", action.past_tense().to_lowercase()),
                    e.to_string(),
                ));
                Err(ActionError::Store(e))
            }
        }
    }
}

fn success_notice(action: RowAction, id: ItemId, outcome: &ActionOutcome) -> Notification {
    match (action, outcome) {
        (RowAction::Duplicate, ActionOutcome::Duplicated { new_id }) => {
            Notification::success("Item duplicated", format!("Created draft copy #{new_id}"))
        }
        (RowAction::Publish, _) => Notification::success("Item published", format!("Agenda item #{id} is now live")),
        (RowAction::Unpublish, _) => {
            Notification::success("Item unpublished", format!("Agenda item #{id} moved back to draft"))
        }
        (RowAction::Delete, _) => Notification::success("Item deleted", format!("Agenda item #{id} was removed")),
        _ => Notification::success("Done", format!("Agenda item #{id} updated")),
    }
}

fn bulk_notice(action: BulkAction, affected: u64, requested: usize) -> Notification {
    let verb = action.past_tense();
    if affected as usize == requested {
        let plural = if affected == 1 { "" } else { "s" };
        Notification::success(format!("{verb} {affected} item{plural}"), "")
    } else {
        Notification::success(
            format!("{verb} {affected} of {requested} items"),
            format!("{} item(s) were no longer available", requested - affected as usize),
        )
    }
}
