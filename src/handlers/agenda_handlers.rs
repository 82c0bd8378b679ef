pub mod actions;
pub mod list;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::listing::{AgendaController, ListingSettings, QueryState};
use crate::notify::FlashNotifier;
use crate::store::{RecordStore, SharedStore};

pub use self::actions::{bulk_action, open_action, row_action};
pub use self::list::{apply_filters, list};

/// Hidden `return_query` field carried by every form on the listing page, so a
/// POST can send the admin back to exactly the URL they came from.
#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    #[serde(default)]
    pub return_query: String,
}

/// Per-request controller over the shared store, reporting through the session flash.
pub(crate) fn controller(
    store: &web::Data<SharedStore>,
    settings: &web::Data<ListingSettings>,
    session: &Session,
    query: QueryState,
) -> AgendaController<dyn RecordStore, FlashNotifier> {
    AgendaController::new(
        store.get_ref().clone(),
        FlashNotifier::new(session.clone()),
        settings.get_ref().clone(),
    )
    .with_query(query)
}

pub(crate) fn see_other(location: impl Into<String>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location.into()))
        .finish()
}

/// Register the listing routes under the admin path.
/// Fixed segments (`/filters`, `/bulk`) are registered before `/{id}/...`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/agenda", web::get().to(list))
        .route("/admin/agenda/filters", web::post().to(apply_filters))
        .route("/admin/agenda/bulk", web::post().to(bulk_action))
        .route("/admin/agenda/{id}/actions/{action}", web::post().to(row_action))
        .route("/admin/agenda/{id}/actions/{action}", web::get().to(open_action));
}
