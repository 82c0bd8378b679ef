use actix_session::Session;
use actix_web::{web, HttpResponse};

use super::{controller, see_other, ReturnForm};
use crate::errors::AppError;
use crate::listing::{ActionOutcome, BulkAction, InFlightRegistry, ListingSettings, QueryState, RowAction};
use crate::notify::{FlashNotifier, Notification, Notifier};
use crate::store::SharedStore;

fn parse_row_action(action: &str) -> Result<RowAction, AppError> {
    RowAction::parse(action).ok_or_else(|| AppError::BadRequest(format!("Unknown action '{action}'")))
}

fn follow(outcome: ActionOutcome, back: String) -> HttpResponse {
    match outcome {
        ActionOutcome::Navigate(location) | ActionOutcome::OpenExternal(location) => see_other(location),
        ActionOutcome::Updated { .. } | ActionOutcome::Duplicated { .. } => see_other(back),
    }
}

/// POST /admin/agenda/{id}/actions/{action}
/// Failures are already reported to the flash by the controller, so every
/// outcome other than a navigation lands back on the listing. The listing is
/// only refetched by a successful mutation.
pub async fn row_action(
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
    in_flight: web::Data<InFlightRegistry>,
    session: Session,
    path: web::Path<(i64, String)>,
    form: web::Form<ReturnForm>,
) -> Result<HttpResponse, AppError> {
    let (id, action) = path.into_inner();
    let action = parse_row_action(&action)?;
    let query = QueryState::parse(&form.return_query);
    let back = query.href(&settings.admin_path);

    let ctl = controller(&store, &settings, &session, query)
        .with_in_flight(in_flight.get_ref().clone());
    Ok(match ctl.apply(action, id).await {
        Ok(outcome) => follow(outcome, back),
        Err(_) => see_other(back),
    })
}

/// GET /admin/agenda/{id}/actions/{action}
/// Only the navigation actions are reachable through a plain link.
pub async fn open_action(
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
    session: Session,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, AppError> {
    let (id, action) = path.into_inner();
    let action = parse_row_action(&action)?;
    if action.mutates() {
        return Err(AppError::BadRequest(format!(
            "'{}' must be submitted with POST",
            action.as_str()
        )));
    }

    let back = settings.admin_path.clone();
    let ctl = controller(&store, &settings, &session, QueryState::default());
    Ok(match ctl.apply(action, id).await {
        Ok(outcome) => follow(outcome, back),
        Err(_) => see_other(back),
    })
}

/// POST /admin/agenda/bulk
/// Form body: `action`, `return_query` and one `item_ids` per checked row.
/// Only ids that are on the page described by `return_query` are acted on.
pub async fn bulk_action(
    store: web::Data<SharedStore>,
    settings: web::Data<ListingSettings>,
    in_flight: web::Data<InFlightRegistry>,
    session: Session,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let mut action = None;
    let mut return_query = String::new();
    let mut ids = Vec::new();
    for (key, value) in form.into_inner() {
        match key.as_str() {
            "action" => action = Some(value),
            "return_query" => return_query = value,
            "item_ids" => match value.parse::<i64>() {
                Ok(id) => ids.push(id),
                Err(_) => log::warn!("Ignoring malformed agenda id '{value}' in bulk form"),
            },
            _ => {}
        }
    }

    let action = action
        .as_deref()
        .and_then(BulkAction::parse)
        .ok_or_else(|| AppError::BadRequest("Missing or unknown bulk action".to_string()))?;
    let query = QueryState::parse(&return_query);
    let back = query.href(&settings.admin_path);

    let ctl = controller(&store, &settings, &session, query)
        .with_in_flight(in_flight.get_ref().clone());
    let snapshot = ctl.refresh().await;
    if let Some(err) = snapshot.error() {
        FlashNotifier::new(session.clone())
            .notify(Notification::failure("Could not load the agenda", err.to_string()));
        return Ok(see_other(back));
    }

    for id in ids {
        if !ctl.is_selected(id) {
            ctl.toggle(id);
        }
    }
    // Errors are already in the flash.
    let _ = ctl.apply_bulk(action).await;
    Ok(see_other(back))
}
