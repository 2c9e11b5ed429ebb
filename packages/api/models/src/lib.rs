#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wire types for the environmental reporting REST API.
//!
//! The backend is loosely typed: ids and coordinates may arrive as
//! numbers or numeric strings, and severities are free-form strings.
//! These types keep the raw values and expose lenient accessors. Records
//! whose shape is still unusable are dropped one at a time by the client
//! rather than failing the whole response.

use chrono::NaiveDate;
use ecowatch_severity_models::Severity;
use serde::{Deserialize, Deserializer, Serialize};

/// Standard `{success, count, data, message}` response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the backend handled the request.
    #[serde(default)]
    pub success: bool,
    /// Number of records in `data`, when the endpoint reports it.
    pub count: Option<u64>,
    /// Response payload.
    pub data: Option<T>,
    /// Error or status message.
    pub message: Option<String>,
}

/// A location as returned by `GET /api/locations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiLocation {
    /// Location primary key.
    #[serde(default, deserialize_with = "lenient_id")]
    pub location_id: Option<i64>,
    /// Display name of the city or municipality.
    #[serde(default)]
    pub city_name: Option<String>,
    /// `city` or `municipality`.
    #[serde(default)]
    pub location_type: Option<String>,
    /// Latitude as sent by the backend (number or numeric string).
    #[serde(default)]
    pub latitude: Option<serde_json::Value>,
    /// Longitude as sent by the backend (number or numeric string).
    #[serde(default)]
    pub longitude: Option<serde_json::Value>,
    /// Severity tier stored on the server.
    #[serde(default)]
    pub severity_level: Option<String>,
    /// Report counter stored on the server.
    #[serde(default, deserialize_with = "lenient_id")]
    pub total_reports: Option<i64>,
}

impl ApiLocation {
    /// Parsed latitude, if present, numeric and within `[-90, 90]`.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.latitude
            .as_ref()
            .and_then(parse_coordinate)
            .filter(|lat| (-90.0..=90.0).contains(lat))
    }

    /// Parsed longitude, if present, numeric and within `[-180, 180]`.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.longitude
            .as_ref()
            .and_then(parse_coordinate)
            .filter(|lon| (-180.0..=180.0).contains(lon))
    }

    /// The server-side severity tier, if it is a recognized label.
    #[must_use]
    pub fn server_severity(&self) -> Option<Severity> {
        self.severity_level.as_deref().and_then(Severity::from_label)
    }
}

/// The nested location object embedded in a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiReportLocation {
    /// Location primary key.
    #[serde(default, deserialize_with = "lenient_id")]
    pub location_id: Option<i64>,
}

/// An environmental report as returned by `GET /api/reports`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiReport {
    /// Report primary key.
    #[serde(default, deserialize_with = "lenient_id")]
    pub report_id: Option<i64>,
    /// Embedded location the report belongs to.
    #[serde(default)]
    pub location: Option<ApiReportLocation>,
    /// Flat location reference, used when no nested location is sent.
    #[serde(default, deserialize_with = "lenient_id")]
    pub location_id: Option<i64>,
    /// Severity label (normally a string, tolerated as anything).
    #[serde(default)]
    pub severity: Option<serde_json::Value>,
    /// Short title.
    #[serde(default)]
    pub title: Option<String>,
    /// Report type (e.g. `pollution`, `habitat_loss`).
    #[serde(default)]
    pub report_type: Option<String>,
    /// Moderation status (e.g. `pending`, `completed`).
    #[serde(default)]
    pub status: Option<String>,
    /// Date of the observation (`YYYY-MM-DD`).
    #[serde(default)]
    pub report_date: Option<String>,
}

impl ApiReport {
    /// The location this report belongs to.
    ///
    /// Prefers the embedded location object over the flat field.
    #[must_use]
    pub fn location_id(&self) -> Option<i64> {
        self.location
            .as_ref()
            .and_then(|loc| loc.location_id)
            .or(self.location_id)
    }

    /// The raw severity label, if the backend sent a string.
    #[must_use]
    pub fn severity_label(&self) -> Option<&str> {
        self.severity.as_ref().and_then(serde_json::Value::as_str)
    }

    /// The parsed observation date, if present and well-formed.
    #[must_use]
    pub fn report_date(&self) -> Option<NaiveDate> {
        self.report_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok())
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned by the map endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

/// Parses an integer id or counter that may be a JSON integer, an
/// integral float (`3.0`) or a numeric string.
#[must_use]
pub fn parse_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(f: f64) -> Option<i64> {
    if !(-9.0e15..=9.0e15).contains(&f) {
        return None;
    }
    let id = f as i64;
    ((id as f64 - f).abs() < f64::EPSILON).then_some(id)
}

/// Deserializes an optional id with [`parse_id`]. Unparseable values
/// become `None`.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_id))
}

/// Parses a coordinate that may be a JSON number or a numeric string.
///
/// Non-finite values are rejected.
#[must_use]
pub fn parse_coordinate(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
