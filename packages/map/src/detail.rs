//! Per-location detail view reached from a marker popup.

use chrono::NaiveDate;
use ecowatch_api_models::ApiReport;
use ecowatch_severity_models::{Severity, SeverityBreakdown};
use serde::Serialize;

use crate::marker::{LatLng, Marker};

/// One tier's share of a location's reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierCount {
    /// Severity tier.
    pub severity: Severity,
    /// Number of reports in the tier.
    pub count: usize,
}

/// Short summary of one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Report id, if the backend sent one.
    pub report_id: Option<i64>,
    /// Report title.
    pub title: Option<String>,
    /// Report type.
    pub report_type: Option<String>,
    /// Moderation status.
    pub status: Option<String>,
    /// Severity label as sent by the backend.
    pub severity: Option<String>,
    /// Observation date.
    pub report_date: Option<NaiveDate>,
}

impl From<&ApiReport> for ReportSummary {
    fn from(report: &ApiReport) -> Self {
        Self {
            report_id: report.report_id,
            title: report.title.clone(),
            report_type: report.report_type.clone(),
            status: report.status.clone(),
            severity: report.severity_label().map(String::from),
            report_date: report.report_date(),
        }
    }
}

/// Everything the detail view shows for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    /// Location id.
    pub location_id: i64,
    /// Location display name.
    pub name: String,
    /// `city` or `municipality`, when known.
    pub location_type: Option<String>,
    /// Marker position.
    pub position: LatLng,
    /// Aggregate severity.
    pub severity: Severity,
    /// Marker color for the aggregate tier.
    pub color: &'static str,
    /// Marker glyph for the aggregate tier.
    pub glyph: &'static str,
    /// Report count shown in the popup.
    pub report_count: usize,
    /// Per-tier counts, most severe first.
    pub breakdown: Vec<TierCount>,
    /// Most recent observation date among the location's reports.
    pub latest_report_date: Option<NaiveDate>,
    /// Reports, newest first; undated reports last.
    pub reports: Vec<ReportSummary>,
}

impl LocationDetail {
    /// Builds the detail view for `marker` from its reports.
    #[must_use]
    pub fn new(marker: &Marker, reports: &[ApiReport]) -> Self {
        let breakdown = SeverityBreakdown::from_labels(reports.iter().map(ApiReport::severity_label));

        let mut summaries: Vec<ReportSummary> = reports.iter().map(ReportSummary::from).collect();
        // `None` sorts before `Some`, so reversing puts undated reports last.
        summaries.sort_by(|a, b| b.report_date.cmp(&a.report_date));

        let style = marker.style();

        Self {
            location_id: marker.location_id,
            name: marker.name.clone(),
            location_type: marker.location_type.clone(),
            position: marker.position,
            severity: marker.severity,
            color: style.color,
            glyph: style.glyph,
            report_count: marker.report_count,
            breakdown: breakdown
                .iter()
                .map(|(severity, count)| TierCount { severity, count })
                .collect(),
            latest_report_date: summaries.iter().find_map(|s| s.report_date),
            reports: summaries,
        }
    }
}
