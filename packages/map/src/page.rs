//! Standalone Leaflet page for a rendered map.

use std::fmt::Write as _;

use ecowatch_severity_models::{Severity, SeverityFilter};

use crate::popup::escape_html;
use crate::renderer::MapRenderer;

const TEMPLATE: &str = include_str!("../templates/map.html");

/// Renders a self-contained HTML page showing every marker of `renderer`.
///
/// Markers are embedded as `GeoJSON`; the page's severity `<select>` starts
/// at the renderer's active filter and toggles marker opacity/visibility
/// client-side.
#[must_use]
pub fn render_page(renderer: &MapRenderer, title: &str) -> String {
    let config = renderer.config();
    let geojson = geojson::GeoJson::from(renderer.to_geojson()).to_string();

    TEMPLATE
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{FILTER_OPTIONS}}", &filter_options(renderer.filter()))
        .replace("{{CENTER_LAT}}", &config.center[0].to_string())
        .replace("{{CENTER_LON}}", &config.center[1].to_string())
        .replace("{{ZOOM}}", &config.zoom.to_string())
        .replace("{{TILE_URL}}", &script_string(&config.tile_url))
        .replace("{{ATTRIBUTION}}", &script_string(&config.attribution))
        .replace("{{MARKERS}}", &script_safe(&geojson))
}

fn filter_options(active: SeverityFilter) -> String {
    let filters = std::iter::once(SeverityFilter::All)
        .chain(Severity::ALL.iter().rev().map(|s| SeverityFilter::Only(*s)));

    let mut out = String::new();
    for filter in filters {
        let selected = if filter == active { " selected" } else { "" };
        writeln!(out, "      <option value=\"{filter}\"{selected}>{filter}</option>").unwrap();
    }
    out
}

/// Encodes `value` as a JavaScript string literal.
fn script_string(value: &str) -> String {
    script_safe(&serde_json::Value::from(value).to_string())
}

/// Keeps embedded JSON from closing the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use ecowatch_api_models::{ApiLocation, ApiReport, ApiReportLocation};
    use ecowatch_client::MapData;
    use serde_json::json;

    fn renderer() -> MapRenderer {
        let mut renderer = MapRenderer::new(MapConfig::default());
        renderer.render(MapData {
            locations: vec![ApiLocation {
                location_id: Some(1),
                city_name: Some("Mabini</script>".to_string()),
                latitude: Some(json!(13.7639)),
                longitude: Some(json!(120.9417)),
                ..ApiLocation::default()
            }],
            reports: vec![ApiReport {
                location: Some(ApiReportLocation {
                    location_id: Some(1),
                }),
                severity: Some(json!("Critical")),
                ..ApiReport::default()
            }],
        });
        renderer
    }

    #[test]
    fn page_embeds_markers_and_view() {
        let page = render_page(&renderer(), "Report Map");
        assert!(page.contains("<title>Report Map</title>"));
        assert!(page.contains("setView([13.8595, 120.978], 10)"));
        assert!(page.contains("\"FeatureCollection\""));
        assert!(page.contains("#D92D2D"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn embedded_data_cannot_close_script() {
        let page = render_page(&renderer(), "Report Map");
        assert!(!page.contains("Mabini</script>"));
    }

    #[test]
    fn active_filter_is_preselected() {
        let mut renderer = renderer();
        renderer.apply_filter(SeverityFilter::Only(Severity::Critical));
        let page = render_page(&renderer, "Report Map");
        assert!(page.contains("<option value=\"Critical\" selected>Critical</option>"));
        assert!(page.contains("<option value=\"All\">All</option>"));
    }
}
