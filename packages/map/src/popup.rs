//! Popup markup bound to each marker.

use std::fmt::Write as _;

use crate::config::MapConfig;
use crate::marker::Marker;

/// Builds the popup shown when a marker is clicked.
///
/// Lists the location name, region, report count and severity label with
/// its glyph, followed by a "View Details" link to the location's detail
/// view.
///
/// # Panics
///
/// Never in practice; writing to a `String` cannot fail.
#[must_use]
pub fn popup_html(marker: &Marker, config: &MapConfig) -> String {
    let style = marker.style();
    let mut html = String::with_capacity(512);

    html.push_str("<div class=\"marker-popup\">");
    write!(
        html,
        "<h4 class=\"popup-title\">{}</h4>",
        escape_html(&marker.name)
    )
    .unwrap();
    write!(
        html,
        "<p class=\"popup-region\">{}</p>",
        escape_html(&config.region_label)
    )
    .unwrap();
    write!(
        html,
        "<p>Total Reports: <strong>{}</strong></p>",
        marker.report_count
    )
    .unwrap();
    write!(
        html,
        "<p>Severity: <strong style=\"color: {};\">{} {}</strong></p>",
        style.color, style.glyph, marker.severity
    )
    .unwrap();
    write!(
        html,
        "<a class=\"popup-action\" href=\"{}\">View Details &rarr;</a>",
        escape_html(&config.detail_url_for(marker.location_id))
    )
    .unwrap();
    html.push_str("</div>");

    html
}

/// Escapes the five HTML-significant characters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{LatLng, VISIBLE_OPACITY};
    use ecowatch_severity_models::Severity;

    fn marker(name: &str) -> Marker {
        Marker {
            location_id: 12,
            name: name.to_string(),
            location_type: Some("city".to_string()),
            position: LatLng {
                lat: 13.7562,
                lon: 121.0573,
            },
            severity: Severity::Critical,
            report_count: 4,
            visible: true,
            opacity: VISIBLE_OPACITY,
        }
    }

    #[test]
    fn popup_lists_name_count_and_severity() {
        let html = popup_html(&marker("Batangas City"), &MapConfig::default());
        assert!(html.contains("Batangas City"));
        assert!(html.contains("Batangas Province"));
        assert!(html.contains("Total Reports: <strong>4</strong>"));
        assert!(html.contains("#D92D2D"));
        assert!(html.contains("! Critical"));
        assert!(html.contains("href=\"/map/locations/12\""));
    }

    #[test]
    fn popup_escapes_location_names() {
        let html = popup_html(&marker("<script>alert('x')</script>"), &MapConfig::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(escape_html(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }
}
