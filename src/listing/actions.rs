use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::agenda_item::{ItemId, ItemStatus};
use crate::store::StoreError;

/// Per-row action from the listing's action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    Publish,
    Unpublish,
    Duplicate,
    Delete,
    Edit,
    View,
}

impl RowAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "publish" => Some(RowAction::Publish),
            "unpublish" => Some(RowAction::Unpublish),
            "duplicate" => Some(RowAction::Duplicate),
            "delete" => Some(RowAction::Delete),
            "edit" => Some(RowAction::Edit),
            "view" => Some(RowAction::View),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RowAction::Publish => "publish",
            RowAction::Unpublish => "unpublish",
            RowAction::Duplicate => "duplicate",
            RowAction::Delete => "delete",
            RowAction::Edit => "edit",
            RowAction::View => "view",
        }
    }

    pub fn mutates(&self) -> bool {
        !matches!(self, RowAction::Edit | RowAction::View)
    }
}

/// Actions available on the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Publish,
    Unpublish,
}

impl BulkAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "publish" => Some(BulkAction::Publish),
            "unpublish" => Some(BulkAction::Unpublish),
            _ => None,
        }
    }

    pub fn target_status(&self) -> ItemStatus {
        match self {
            BulkAction::Publish => ItemStatus::Published,
            BulkAction::Unpublish => ItemStatus::Draft,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Publish => "Published",
            BulkAction::Unpublish => "Unpublished",
        }
    }
}

/// What the caller should do after a successful action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Store mutated and listing refetched.
    Updated { affected: u64 },
    /// A copy was created with this id.
    Duplicated { new_id: ItemId },
    /// Go to an admin screen (edit form).
    Navigate(String),
    /// Open the public page in a new context.
    OpenExternal(String),
}

/// Key used to reject a second submission while the first is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InFlightKey {
    Row(RowAction, ItemId),
    Bulk(BulkAction),
}

/// Actions currently running. One registry is shared by every controller in
/// the process, so a repeated submission is rejected across requests too.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, HashSet<InFlightKey>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    pub(crate) fn begin(&self, key: InFlightKey) -> Result<InFlightGuard, ActionError> {
        if !self.keys().insert(key) {
            log::warn!("Rejected duplicate agenda action {key:?}");
            return Err(ActionError::InFlight);
        }
        Ok(InFlightGuard { registry: self.clone(), key })
    }
}

/// Releases an in-flight key when the action finishes, however it finishes.
pub(crate) struct InFlightGuard {
    registry: InFlightRegistry,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.keys().remove(&self.key);
    }
}

#[derive(Debug)]
pub enum ActionError {
    Store(StoreError),
    InFlight,
    NothingSelected,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Store(e) => write!(f, "{e}"),
            ActionError::InFlight => write!(f, "The same action is already running"),
            ActionError::NothingSelected => write!(f, "No items selected"),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        ActionError::Store(e)
    }
}
