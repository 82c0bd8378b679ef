use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpResponse, HttpServer, cookie::Key, middleware, web};

use agenda_admin::config::AppConfig;
use agenda_admin::listing::InFlightRegistry;
use agenda_admin::store::{InMemoryStore, PgRecordStore, SharedStore};
use agenda_admin::{db, errors, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let use_memory = std::env::args().any(|a| a == "--memory");
    let config = AppConfig::from_env(!use_memory).map_err(std::io::Error::other)?;

    let store: SharedStore = match config.database_url.as_deref() {
        Some(url) if !use_memory => {
            let pool = db::init_pool(&config, url).await.map_err(std::io::Error::other)?;
            db::run_migrations(&pool).await.map_err(std::io::Error::other)?;
            Arc::new(PgRecordStore::new(pool))
        }
        _ => {
            log::warn!("Running on the in-memory store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    // SESSION_KEY keeps flash cookies valid across restarts
    let secret_key = match config.session_key.as_deref() {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let settings = config.listing_settings();
    let in_flight = web::Data::new(InFlightRegistry::new());
    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(settings.clone()))
            .app_data(in_flight.clone())
            .route("/", web::get().to(|| async {
                HttpResponse::SeeOther()
                    .insert_header(("Location", "/admin/agenda"))
                    .finish()
            }))
            .configure(handlers::agenda_handlers::configure)
            .service(web::scope("/api/v1").configure(handlers::api_v1::configure))
            .default_service(web::to(errors::not_found))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
