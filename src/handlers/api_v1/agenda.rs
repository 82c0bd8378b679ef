use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::errors::AppError;
use crate::listing::{
    ActionError, AgendaController, InFlightRegistry, ListingSettings, QueryState, RowAction,
};
use crate::notify::LogNotifier;
use crate::store::{RecordStore, SharedStore, StoreError};
use crate::templates_structs::{
    ApiActionResponse, ApiAgendaItem, ApiBulkRequest, ApiErrorResponse, PaginatedResponse,
};

fn controller(
    store: &web::Data<SharedStore>,
    settings: &web::Data<ListingSettings>,
    query: QueryState,
) -> AgendaController<dyn RecordStore, LogNotifier> {
    AgendaController::new(store.get_ref().clone(), LogNotifier, settings.get_ref().clone())
        .with_query(query)
}

fn unavailable(details: &str) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ApiErrorResponse {
        error: "Agenda listing unavailable".to_string(),
        details: Some(details.to_string()),
    })
}

fn action_error_response(e: ActionError) -> HttpResponse {
    let body = ApiErrorResponse { error: e.to_string(), details: None };
    match e {
        ActionError::NothingSelected => HttpResponse::BadRequest().json(body),
        ActionError::InFlight => HttpResponse::Conflict().json(body),
        ActionError::Store(StoreError::NotFound) => HttpResponse::NotFound().json(body),
        ActionError::Store(_) => HttpResponse::ServiceUnavailable().json(body),
    }
}

/// GET /api/v1/agenda - Same filters and paging as the admin listing.
/// Query params: search, status, visibility, city, dateStart, dateEnd, page.
pub async fn list(
    req: HttpRequest,
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
) -> Result<HttpResponse, AppError> {
    let ctl = controller(&store, &settings, QueryState::parse(req.query_string()));
    let snapshot = ctl.refresh().await;
    if let Some(err) = snapshot.error() {
        return Ok(unavailable(err));
    }

    let now = Utc::now();
    let items: Vec<ApiAgendaItem> = snapshot
        .rows
        .into_iter()
        .map(|item| ApiAgendaItem::from_item(item, now))
        .collect();

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        items,
        page: snapshot.page,
        per_page: settings.page_size,
        total: snapshot.total_count,
    }))
}

/// POST /api/v1/agenda/bulk - Publish or unpublish a set of ids.
/// Ids that are not on the page described by `query` are ignored.
pub async fn bulk(
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
    in_flight: web::Data<InFlightRegistry>,
    body: web::Json<ApiBulkRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let ctl = controller(&store, &settings, QueryState::parse(&body.query))
        .with_in_flight(in_flight.get_ref().clone());
    let snapshot = ctl.refresh().await;
    if let Some(err) = snapshot.error() {
        return Ok(unavailable(err));
    }

    for id in body.ids {
        if !ctl.is_selected(id) {
            ctl.toggle(id);
        }
    }
    Ok(match ctl.apply_bulk(body.action).await {
        Ok(outcome) => HttpResponse::Ok().json(ApiActionResponse::from(outcome)),
        Err(e) => action_error_response(e),
    })
}

/// POST /api/v1/agenda/{id}/{action} - Run one row action.
/// Navigation actions answer with the target location instead of redirecting.
pub async fn row_action(
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
    in_flight: web::Data<InFlightRegistry>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, AppError> {
    let (id, action) = path.into_inner();
    let action = RowAction::parse(&action)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown action '{action}'")))?;

    let ctl = controller(&store, &settings, QueryState::default())
        .with_in_flight(in_flight.get_ref().clone());
    Ok(match ctl.apply(action, id).await {
        Ok(outcome) => HttpResponse::Ok().json(ApiActionResponse::from(outcome)),
        Err(e) => action_error_response(e),
    })
}
