//! HTTP handler functions for the map server.

use actix_web::{HttpResponse, web};
use ecowatch_api_models::{ApiError, ApiHealth};
use ecowatch_map::{MapRenderer, render_page};
use ecowatch_severity_models::SeverityFilter;
use serde::Deserialize;

use crate::AppState;

const PAGE_TITLE: &str = "Environmental Report Map";

/// Query parameters accepted by the map routes.
#[derive(Debug, Clone, Deserialize)]
pub struct MapQueryParams {
    /// `All` or a severity tier label.
    pub severity: Option<String>,
}

impl MapQueryParams {
    fn filter(&self) -> Result<SeverityFilter, HttpResponse> {
        self.severity
            .as_deref()
            .map_or(Ok(SeverityFilter::All), str::parse)
            .map_err(|e| HttpResponse::BadRequest().json(ApiError {
                error: e.to_string(),
            }))
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /map`
///
/// Renders the Leaflet page. A failed load still renders the page, with
/// no markers.
pub async fn map_page(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let filter = params.filter().unwrap_or_else(|_| {
        log::warn!("Ignoring invalid severity filter {:?}", params.severity);
        SeverityFilter::All
    });

    let mut renderer = MapRenderer::new(state.config.clone());
    renderer.apply_filter(filter);
    // Failures are logged by the renderer, which leaves the layer empty.
    let _ = renderer.load(&state.client).await;

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_page(&renderer, PAGE_TITLE))
}

/// `GET /map/markers`
///
/// Returns every marker as `GeoJSON` with the requested filter applied.
pub async fn markers(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let filter = match params.filter() {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let mut renderer = MapRenderer::new(state.config.clone());
    if let Err(e) = renderer.load(&state.client).await {
        return bad_gateway(&format!("Failed to load map data: {e}"));
    }
    renderer.apply_filter(filter);

    HttpResponse::Ok()
        .content_type("application/geo+json")
        .json(renderer.to_geojson())
}

/// `GET /map/locations/{id}`
///
/// Returns the detail view of one location.
pub async fn location_detail(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let location_id = path.into_inner();

    let mut renderer = MapRenderer::new(state.config.clone());
    if let Err(e) = renderer.load(&state.client).await {
        return bad_gateway(&format!("Failed to load map data: {e}"));
    }

    renderer.detail(location_id).map_or_else(
        || {
            HttpResponse::NotFound().json(ApiError {
                error: format!("Location {location_id} has no marker"),
            })
        },
        |detail| HttpResponse::Ok().json(detail),
    )
}

fn bad_gateway(message: &str) -> HttpResponse {
    log::error!("{message}");
    HttpResponse::BadGateway().json(ApiError {
        error: message.to_string(),
    })
}
