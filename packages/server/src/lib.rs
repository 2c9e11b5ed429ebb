#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web host for the environmental report severity map.
//!
//! Every request to a map route performs a fresh load: locations and
//! reports are fetched concurrently from the reporting API, rendered into
//! a new marker layer, and served as a Leaflet page, marker `GeoJSON`, or
//! a per-location detail view. Nothing is cached between requests.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use ecowatch_client::ApiClient;
use ecowatch_map::MapConfig;

/// Shared application state.
pub struct AppState {
    /// Client for the reporting API.
    pub client: ApiClient,
    /// Map display settings.
    pub config: MapConfig,
}

/// Registers the API and map routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/health", web::get().to(handlers::health)))
        .service(
            web::scope("/map")
                .route("", web::get().to(handlers::map_page))
                .route("/markers", web::get().to(handlers::markers))
                .route("/locations/{id}", web::get().to(handlers::location_detail)),
        );
}

/// Starts the map server.
///
/// Reads the map config (`ECOWATCH_MAP_CONFIG`), the API client settings
/// (`ECOWATCH_API_URL` and friends) and the bind address (`BIND_ADDR`,
/// `PORT`) from the environment. The caller provides the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the config or client cannot be
/// built, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!("Loading map config...");
    let config = MapConfig::load().map_err(std::io::Error::other)?;

    let client = ApiClient::from_env().map_err(std::io::Error::other)?;
    log::info!("Reporting API at {}", client.config().base_url);

    let state = web::Data::new(AppState { client, config });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
