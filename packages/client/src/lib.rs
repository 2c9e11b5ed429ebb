#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the environmental reporting REST API.
//!
//! Only the two read endpoints the map needs are covered:
//! `GET /api/locations` and `GET /api/reports`. [`ApiClient::fetch_map_data`]
//! issues both concurrently and joins them, failing as soon as either
//! request fails so that callers never see half a data set.

use std::time::Duration;

use ecowatch_api_models::{ApiEnvelope, ApiLocation, ApiReport};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default backend address when `ECOWATCH_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 200;

/// Errors from API requests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Response body was not the expected JSON.
    #[error("Parse error for {url}: {message}")]
    Parse {
        /// Requested URL.
        url: String,
        /// Description of the parsing failure.
        message: String,
    },

    /// The envelope reported `success: false` or carried no data.
    #[error("{url} reported failure: {message}")]
    Unsuccessful {
        /// Requested URL.
        url: String,
        /// Message from the envelope, if any.
        message: String,
    },
}

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash (e.g. `http://127.0.0.1:5000`).
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// `limit` query parameter for `/api/reports`. The backend returns at
    /// most 100 reports when this is unset.
    pub report_limit: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            report_limit: None,
        }
    }
}

impl ClientConfig {
    /// Reads `ECOWATCH_API_URL`, `ECOWATCH_API_TIMEOUT_SECS` and
    /// `ECOWATCH_REPORT_LIMIT`, falling back to defaults for unset or
    /// unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("ECOWATCH_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let timeout_secs = std::env::var("ECOWATCH_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);
        let report_limit = std::env::var("ECOWATCH_REPORT_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok());

        Self {
            base_url,
            timeout_secs,
            report_limit,
        }
    }
}

/// Locations and reports fetched together for one map load.
#[derive(Debug, Clone, Default)]
pub struct MapData {
    /// Every location known to the backend.
    pub locations: Vec<ApiLocation>,
    /// Every report the backend returned.
    pub reports: Vec<ApiReport>,
}

/// Read-only client for the location and report endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Builds a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Builds a client from environment variables (see
    /// [`ClientConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env())
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /api/locations`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request, status, body decode or
    /// envelope check fails.
    pub async fn fetch_locations(&self) -> Result<Vec<ApiLocation>, ClientError> {
        let locations: Vec<ApiLocation> = self.fetch_records("/api/locations", &[]).await?;
        log::info!("Locations loaded: {}", locations.len());
        Ok(locations)
    }

    /// `GET /api/reports`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request, status, body decode or
    /// envelope check fails.
    pub async fn fetch_reports(&self) -> Result<Vec<ApiReport>, ClientError> {
        let limit = self.config.report_limit.map(|l| l.to_string());
        let query: Vec<(&str, &str)> = limit
            .as_deref()
            .map(|l| vec![("limit", l)])
            .unwrap_or_default();

        let reports: Vec<ApiReport> = self.fetch_records("/api/reports", &query).await?;
        log::info!("Reports loaded: {}", reports.len());
        Ok(reports)
    }

    /// Fetches locations and reports concurrently.
    ///
    /// Both requests are in flight at the same time; the first failure is
    /// returned and the other result is discarded.
    ///
    /// # Errors
    ///
    /// Returns the first [`ClientError`] from either request.
    pub async fn fetch_map_data(&self) -> Result<MapData, ClientError> {
        let (locations, reports) = tokio::try_join!(self.fetch_locations(), self.fetch_reports())?;
        Ok(MapData { locations, reports })
    }

    async fn fetch_records<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ClientError> {
        let url = format!("{}{path}", self.config.base_url);
        log::debug!("GET {url}");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        decode_records(&url, &text)
    }
}

/// Decodes a `{success, data}` envelope and unwraps its payload.
///
/// # Errors
///
/// Returns [`ClientError::Parse`] if the body isn't a valid envelope, or
/// [`ClientError::Unsuccessful`] if it reports failure or has no data.
pub fn decode_envelope<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ClientError> {
    let envelope: ApiEnvelope<T> =
        serde_json::from_str(body).map_err(|e| ClientError::Parse {
            url: url.to_string(),
            message: format!("{e} (body: {})", preview(body)),
        })?;

    if !envelope.success {
        return Err(ClientError::Unsuccessful {
            url: url.to_string(),
            message: envelope
                .message
                .unwrap_or_else(|| "success flag was false".to_string()),
        });
    }

    envelope.data.ok_or_else(|| ClientError::Unsuccessful {
        url: url.to_string(),
        message: "response carried no data".to_string(),
    })
}

/// Decodes a `{success, data: [...]}` envelope record by record.
///
/// Array entries that don't match `T` (`null`, wrong field types) are
/// logged and skipped; the rest of the response is kept.
///
/// # Errors
///
/// Fails like [`decode_envelope`] when the envelope itself is unusable or
/// `data` is not an array.
pub fn decode_records<T: DeserializeOwned>(url: &str, body: &str) -> Result<Vec<T>, ClientError> {
    let values: Vec<serde_json::Value> = decode_envelope(url, body)?;
    let total = values.len();

    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed record {i} from {url}: {e}");
                None
            }
        })
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        log::warn!("Skipped {skipped} of {total} records from {url}");
    }

    Ok(records)
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    /// Serves canned `(path, status, body)` responses on a random local port
    /// and returns the base URL.
    async fn serve(routes: Vec<(&'static str, u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = socket.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let target = request.split_whitespace().nth(1).unwrap_or("/");
                    let path = target.split('?').next().unwrap_or(target);

                    let (status, body) = routes
                        .iter()
                        .find(|(p, _, _)| *p == path)
                        .map_or((404, String::new()), |(_, s, b)| (*s, b.clone()));

                    let response = format!(
                        "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    socket.write_all(response.as_bytes()).await.ok();
                    socket.shutdown().await.ok();
                });
            }
        });

        format!("http://{addr}")
    }

    fn client(base_url: String) -> ApiClient {
        ApiClient::new(ClientConfig {
            base_url,
            timeout_secs: 5,
            report_limit: Some(500),
        })
        .unwrap()
    }

    fn locations_body() -> String {
        serde_json::json!({
            "success": true,
            "count": 2,
            "data": [
                {"location_id": 1, "city_name": "Batangas City", "latitude": 13.7562, "longitude": 121.0573},
                {"location_id": 2, "city_name": "Calaca", "latitude": "13.9303", "longitude": "120.8128"}
            ]
        })
        .to_string()
    }

    fn reports_body() -> String {
        serde_json::json!({
            "success": true,
            "count": 1,
            "data": [{"report_id": 5, "location": {"location_id": 1}, "severity": "Critical"}]
        })
        .to_string()
    }

    #[test]
    fn decodes_successful_envelope() {
        let data: Vec<ApiLocation> = decode_envelope("u", &locations_body()).unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn rejects_unsuccessful_envelope() {
        let err = decode_envelope::<Vec<ApiLocation>>(
            "u",
            r#"{"success": false, "message": "db down"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Unsuccessful { ref message, .. } if message == "db down"));

        let err = decode_envelope::<Vec<ApiLocation>>("u", r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, ClientError::Unsuccessful { .. }));
    }

    #[test]
    fn malformed_records_are_skipped_individually() {
        let body = serde_json::json!({
            "success": true,
            "data": [
                {"location_id": 1, "city_name": "Batangas City", "latitude": 13.7562, "longitude": 121.0573},
                {"location_id": "2", "city_name": "Calaca", "latitude": 13.9303, "longitude": 120.8128},
                null,
                {"location_id": 3, "city_name": 42},
                "not a location"
            ]
        })
        .to_string();

        let data: Vec<ApiLocation> = decode_records("u", &body).unwrap();
        let ids: Vec<Option<i64>> = data.iter().map(|l| l.location_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);

        let reports = serde_json::json!({
            "success": true,
            "data": [{"location_id": 1.0, "severity": "High"}, null]
        })
        .to_string();
        let data: Vec<ApiReport> = decode_records("u", &reports).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].location_id(), Some(1));
    }

    #[test]
    fn non_array_data_is_a_parse_error() {
        let err = decode_records::<ApiLocation>("u", r#"{"success": true, "data": {"a": 1}}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));
    }

    #[test]
    fn rejects_garbage_body() {
        let err = decode_envelope::<Vec<ApiLocation>>("u", "<html>oops</html>").unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(BODY_PREVIEW_LEN);
        let p = preview(&body);
        assert!(p.len() <= BODY_PREVIEW_LEN);
        assert!(body.starts_with(p));
    }

    #[tokio::test]
    async fn fetches_both_endpoints() {
        let base = serve(vec![
            ("/api/locations", 200, locations_body()),
            ("/api/reports", 200, reports_body()),
        ])
        .await;

        let data = client(base).fetch_map_data().await.unwrap();
        assert_eq!(data.locations.len(), 2);
        assert_eq!(data.reports.len(), 1);
        assert_eq!(data.reports[0].location_id(), Some(1));
    }

    #[tokio::test]
    async fn bad_entries_do_not_fail_the_load() {
        let locations = serde_json::json!({
            "success": true,
            "data": [
                {"location_id": 1, "city_name": "Batangas City", "latitude": 13.7562, "longitude": 121.0573},
                null
            ]
        })
        .to_string();
        let base = serve(vec![
            ("/api/locations", 200, locations),
            ("/api/reports", 200, reports_body()),
        ])
        .await;

        let data = client(base).fetch_map_data().await.unwrap();
        assert_eq!(data.locations.len(), 1);
        assert_eq!(data.reports.len(), 1);
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_load() {
        let base = serve(vec![
            ("/api/locations", 200, locations_body()),
            ("/api/reports", 500, String::from("{}")),
        ])
        .await;

        let err = client(base).fetch_map_data().await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 500, .. }));
    }
}
