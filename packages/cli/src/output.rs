//! Text formatting for CLI output.

use std::fmt::Write as _;

use ecowatch_map::{LocationDetail, Marker};

/// Formats markers as an aligned plain-text table.
#[must_use]
pub fn marker_table<'a>(markers: impl IntoIterator<Item = &'a Marker>) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:>6}  {:<24}  {:<10}  {:>7}  {:>10}  {:>10}",
        "ID", "NAME", "SEVERITY", "REPORTS", "LAT", "LON"
    )
    .unwrap();
    for marker in markers {
        let severity = format!("{} {}", marker.style().glyph, marker.severity);
        writeln!(
            out,
            "{:>6}  {:<24}  {:<10}  {:>7}  {:>10.4}  {:>10.4}",
            marker.location_id,
            truncate(&marker.name, 24),
            severity,
            marker.report_count,
            marker.position.lat,
            marker.position.lon,
        )
        .unwrap();
    }
    out
}

/// Formats a location detail view.
#[must_use]
pub fn detail_text(detail: &LocationDetail) -> String {
    let mut out = String::new();
    writeln!(out, "{} (#{})", detail.name, detail.location_id).unwrap();
    if let Some(kind) = &detail.location_type {
        writeln!(out, "  Type:      {kind}").unwrap();
    }
    writeln!(
        out,
        "  Position:  {:.4}, {:.4}",
        detail.position.lat, detail.position.lon
    )
    .unwrap();
    writeln!(out, "  Severity:  {} {}", detail.glyph, detail.severity).unwrap();
    writeln!(out, "  Reports:   {}", detail.report_count).unwrap();
    if let Some(date) = detail.latest_report_date {
        writeln!(out, "  Latest:    {date}").unwrap();
    }

    out.push_str("  Breakdown:");
    for tier in &detail.breakdown {
        write!(out, " {}={}", tier.severity, tier.count).unwrap();
    }
    out.push('\n');

    for report in &detail.reports {
        let date = report
            .report_date
            .map_or_else(|| "----------".to_string(), |d| d.to_string());
        writeln!(
            out,
            "  - {date}  {:<9} {}",
            report.severity.as_deref().unwrap_or("?"),
            report.title.as_deref().unwrap_or("(untitled)"),
        )
        .unwrap();
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecowatch_map::{LatLng, VISIBLE_OPACITY};
    use ecowatch_severity_models::Severity;

    fn marker() -> Marker {
        Marker {
            location_id: 21,
            name: "Mataasnakahoy".to_string(),
            location_type: Some("municipality".to_string()),
            position: LatLng {
                lat: 14.0203,
                lon: 121.1111,
            },
            severity: Severity::Medium,
            report_count: 14,
            visible: true,
            opacity: VISIBLE_OPACITY,
        }
    }

    #[test]
    fn table_has_header_and_rows() {
        let m = marker();
        let table = marker_table([&m]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("SEVERITY"));
        assert!(lines[1].contains("Mataasnakahoy"));
        assert!(lines[1].contains("● Medium"));
        assert!(lines[1].contains("14.0203"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
