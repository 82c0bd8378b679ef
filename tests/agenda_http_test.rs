/// HTTP-level tests for the admin listing pages and the JSON API, running the
/// real handlers against the in-memory store.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};

use agenda_admin::listing::InFlightRegistry;
use agenda_admin::models::agenda_item::ItemStatus;
use agenda_admin::store::{InMemoryStore, SharedStore};
use agenda_admin::{errors, handlers};

mod common;
use common::{seeded_items, seeded_store, settings, GatedStore};

macro_rules! agenda_app {
    ($store:expr) => {{
        let shared: SharedStore = $store.clone();
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new(shared))
                .app_data(web::Data::new(settings()))
                .app_data(web::Data::new(InFlightRegistry::new()))
                .configure(handlers::agenda_handlers::configure)
                .service(web::scope("/api/v1").configure(handlers::api_v1::configure))
                .default_service(web::to(errors::not_found)),
        )
        .await
    }};
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn body_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// ---------------------------------------------------------------------------
// Admin pages
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_listing_page_renders_rows() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/admin/agenda").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(&test::read_body(resp).await);
    assert!(body.contains("Jazz Night"));
    assert!(body.contains("Film Club"));
    assert!(body.contains("Page 1 of 1"));
}

#[actix_web::test]
async fn test_listing_page_applies_query_filters() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/admin/agenda?status=draft").to_request();
    let body = body_text(&test::call_and_read_body(&app, req).await);
    assert!(body.contains("Film Club"));
    assert!(!body.contains("Poetry Slam"));
}

#[actix_web::test]
async fn test_listing_page_shows_error_panel_when_store_fails() {
    let store = seeded_store();
    store.set_fail_reads(true);
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/admin/agenda?city=lisbon").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(&test::read_body(resp).await);
    assert!(body.contains("Could not load the agenda"));
    assert!(body.contains("/admin/agenda?city=lisbon"));
}

#[actix_web::test]
async fn test_filter_form_redirects_to_canonical_url() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/admin/agenda/filters")
        .set_form(vec![
            ("search", "jazz"),
            ("status", "all"),
            ("city", ""),
            ("return_query", "page=3&city=porto"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/agenda?search=jazz");
}

#[actix_web::test]
async fn test_bulk_form_publishes_checked_rows() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/admin/agenda/bulk")
        .set_form(vec![
            ("action", "publish"),
            ("return_query", "city=porto"),
            ("item_ids", "4"),
            ("item_ids", "5"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/agenda?city=porto");

    assert_eq!(store.get_raw(4).unwrap().status, ItemStatus::Published);
    assert_eq!(store.get_raw(5).unwrap().status, ItemStatus::Published);
}

#[actix_web::test]
async fn test_bulk_form_ignores_ids_off_the_page() {
    let store = seeded_store();
    let app = agenda_app!(store);

    // Item 4 is a porto draft; the submitted page only shows lisbon rows.
    let req = test::TestRequest::post()
        .uri("/admin/agenda/bulk")
        .set_form(vec![
            ("action", "unpublish"),
            ("return_query", "city=lisbon"),
            ("item_ids", "1"),
            ("item_ids", "4"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    assert_eq!(store.get_raw(1).unwrap().status, ItemStatus::Draft);
    assert_eq!(store.get_raw(4).unwrap().status, ItemStatus::Draft);
    assert_eq!(store.get_raw(2).unwrap().status, ItemStatus::Published);
}

#[actix_web::test]
async fn test_bulk_form_rejects_unknown_action() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/admin/agenda/bulk")
        .set_form(vec![("action", "archive"), ("item_ids", "1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_row_delete_redirects_back_with_flash() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/admin/agenda/3/actions/delete")
        .set_form(vec![("return_query", "status=published")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/agenda?status=published");
    assert!(store.get_raw(3).unwrap().deleted_at.is_some());

    let cookie = resp
        .response()
        .cookies()
        .next()
        .expect("session cookie")
        .into_owned();
    let req = test::TestRequest::get()
        .uri("/admin/agenda?status=published")
        .cookie(cookie)
        .to_request();
    let body = body_text(&test::call_and_read_body(&app, req).await);
    assert!(body.contains("Item deleted"));
    assert!(!body.contains("Street Market"));
}

#[actix_web::test]
async fn test_row_action_failure_still_redirects() {
    let store = seeded_store();
    store.set_fail_writes(true);
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/admin/agenda/4/actions/publish")
        .set_form(vec![("return_query", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/agenda");
    assert_eq!(store.get_raw(4).unwrap().status, ItemStatus::Draft);
}

#[actix_web::test]
async fn test_row_action_only_refetches_after_success() {
    let store = Arc::new(GatedStore::new(InMemoryStore::with_items(seeded_items()), "unused"));
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/admin/agenda/3/actions/delete")
        .set_form(vec![("return_query", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.list_count(), 1);

    store.inner.set_fail_writes(true);
    let req = test::TestRequest::post()
        .uri("/admin/agenda/4/actions/publish")
        .set_form(vec![("return_query", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.list_count(), 1);
}

#[actix_web::test]
async fn test_huge_page_renders_an_empty_page() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get()
        .uri("/admin/agenda?page=9223372036854775807")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(&test::read_body(resp).await);
    assert!(!body.contains("Jazz Night"));

    let req = test::TestRequest::get()
        .uri("/api/v1/agenda?page=9223372036854775807")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["total"], 5);
    assert_eq!(json["items"].as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn test_unknown_route_renders_not_found_page() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/admin/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_text(&test::read_body(resp).await);
    assert!(body.contains("Back to the agenda"));
}

#[actix_web::test]
async fn test_navigation_actions_redirect() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/admin/agenda/3/actions/view").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "https://agenda.example/agenda/street-market");

    let req = test::TestRequest::get().uri("/admin/agenda/3/actions/edit").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/admin/agenda/3/edit");
}

#[actix_web::test]
async fn test_mutations_are_not_reachable_by_get() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/admin/agenda/3/actions/delete").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(store.get_raw(3).unwrap().deleted_at.is_none());

    let req = test::TestRequest::get().uri("/admin/agenda/3/actions/explode").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_api_list_returns_page_with_situation() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/api/v1/agenda?city=porto").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["per_page"], common::PAGE_SIZE);
    let items = json["items"].as_array().expect("items array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], 5);
    assert_eq!(items[0]["status"], "draft");
    assert_eq!(items[0]["situation"], "draft");
}

#[actix_web::test]
async fn test_api_list_unavailable_when_store_fails() {
    let store = seeded_store();
    store.set_fail_reads(true);
    let app = agenda_app!(store);

    let req = test::TestRequest::get().uri("/api/v1/agenda").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert!(json["error"].is_string());
}

#[actix_web::test]
async fn test_api_mutations_require_json() {
    let store = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/agenda/3/delete")
        .set_form(vec![("x", "1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(store.get_raw(3).unwrap().deleted_at.is_none());
}

#[actix_web::test]
async fn test_api_bulk_and_row_actions() {
    let store: Arc<InMemoryStore> = seeded_store();
    let app = agenda_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/agenda/bulk")
        .set_json(serde_json::json!({ "action": "publish", "ids": [4, 5, 99], "query": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["outcome"], "updated");
    assert_eq!(json["affected"], 2);

    let req = test::TestRequest::post()
        .uri("/api/v1/agenda/1/duplicate")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["outcome"], "duplicated");
    assert_eq!(json["new_id"], 6);

    let req = test::TestRequest::post()
        .uri("/api/v1/agenda/42/publish")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/agenda/bulk")
        .set_json(serde_json::json!({ "action": "unpublish", "ids": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_api_rejects_repeat_submission_while_in_flight() {
    let store = Arc::new(
        GatedStore::new(InMemoryStore::with_items(seeded_items()), "unused").gate_find(1),
    );
    let app = agenda_app!(store);
    let duplicate = || {
        test::TestRequest::post()
            .uri("/api/v1/agenda/1/duplicate")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .to_request()
    };

    // Each request gets its own controller; the registry is app-wide.
    let (first, second) = tokio::join!(test::call_service(&app, duplicate()), async {
        store.wait_until_blocked().await;
        let resp = test::call_service(&app, duplicate()).await;
        store.release();
        resp
    });

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json: serde_json::Value = test::read_body_json(second).await;
    assert!(json["error"].is_string());
    assert_eq!(store.inner.all_raw().len(), 6);
}
