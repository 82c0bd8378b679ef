use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use super::{controller, see_other};
use crate::errors::{render, AppError};
use crate::listing::{ListingSettings, QueryState};
use crate::models::agenda_item::filter::keys;
use crate::notify::take_flash;
use crate::store::SharedStore;
use crate::templates_structs::AgendaListTemplate;

/// GET /admin/agenda
/// Renders the listing for the filters in the query string. A failed fetch
/// renders the error panel instead of an error status.
pub async fn list(
    req: HttpRequest,
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let query = QueryState::parse(req.query_string());
    let ctl = controller(&store, &settings, &session, query);
    let snapshot = ctl.refresh().await;

    let tmpl = AgendaListTemplate::build(
        &ctl.query(),
        &snapshot,
        &settings,
        take_flash(&session),
        Utc::now(),
    );
    render(tmpl)
}

#[derive(Debug, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, rename = "dateStart")]
    pub date_start: String,
    #[serde(default, rename = "dateEnd")]
    pub date_end: String,
    #[serde(default)]
    pub return_query: String,
}

/// POST /admin/agenda/filters
/// Folds the submitted filter form into the current URL state and redirects
/// to the canonical listing URL (page reset included).
pub async fn apply_filters(
    settings: web::Data<ListingSettings>,
    form: web::Form<FilterForm>,
) -> HttpResponse {
    let mut query = QueryState::parse(&form.return_query);
    query.update(&[
        (keys::SEARCH, Some(form.search.as_str())),
        (keys::STATUS, Some(form.status.as_str())),
        (keys::VISIBILITY, Some(form.visibility.as_str())),
        (keys::CITY, Some(form.city.as_str())),
        (keys::DATE_START, Some(form.date_start.as_str())),
        (keys::DATE_END, Some(form.date_end.as_str())),
    ]);
    see_other(query.href(&settings.admin_path))
}
