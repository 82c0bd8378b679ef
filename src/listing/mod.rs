//! Admin agenda listing: query-string state, fetching, selection and actions.

pub mod actions;
pub mod controller;
pub mod query_state;
pub mod selection;

pub use actions::{ActionError, ActionOutcome, BulkAction, InFlightRegistry, RowAction};
pub use controller::{AgendaController, FetchStatus, ListingSettings, ListingSnapshot};
pub use query_state::QueryState;
pub use selection::SelectionTracker;
