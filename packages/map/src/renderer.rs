//! Turns fetched locations and reports into a filtered marker layer.

use std::collections::{BTreeMap, BTreeSet};

use ecowatch_api_models::{ApiLocation, ApiReport};
use ecowatch_client::{ApiClient, ClientError, MapData};
use ecowatch_severity_models::{Severity, SeverityFilter, aggregate};
use geojson::FeatureCollection;

use crate::config::{MapConfig, SeveritySource};
use crate::detail::LocationDetail;
use crate::marker::{LatLng, Marker, MarkerLayer, VISIBLE_OPACITY};

/// Owns the marker layer for one map and everything needed to rebuild it.
#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    config: MapConfig,
    layer: MarkerLayer,
    reports_by_location: BTreeMap<i64, Vec<ApiReport>>,
    filter: SeverityFilter,
}

/// Counts from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Markers placed.
    pub markers: usize,
    /// Locations skipped for a missing or repeated id, or unusable
    /// coordinates.
    pub skipped_locations: usize,
    /// Reports dropped because they name no location.
    pub orphan_reports: usize,
}

impl MapRenderer {
    /// Creates an empty renderer.
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The display config.
    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// The active filter.
    #[must_use]
    pub const fn filter(&self) -> SeverityFilter {
        self.filter
    }

    /// The marker layer.
    #[must_use]
    pub const fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    /// All markers, visible or not.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        self.layer.markers()
    }

    /// Markers that pass the active filter.
    pub fn visible_markers(&self) -> impl Iterator<Item = &Marker> {
        self.layer.visible()
    }

    /// The marker for a location.
    #[must_use]
    pub fn marker(&self, location_id: i64) -> Option<&Marker> {
        self.layer.get(location_id)
    }

    /// Fetches locations and reports concurrently, then renders them.
    ///
    /// If either fetch fails the failure is logged, the layer is cleared
    /// so that no partial marker set remains, and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the first failed fetch.
    pub async fn load(&mut self, client: &ApiClient) -> Result<RenderSummary, ClientError> {
        match client.fetch_map_data().await {
            Ok(data) => Ok(self.render(data)),
            Err(e) => {
                log::error!("Map load failed, rendering no markers: {e}");
                self.clear();
                Err(e)
            }
        }
    }

    /// Rebuilds the marker layer from freshly fetched data.
    ///
    /// Reports are grouped by location, each location with usable
    /// coordinates gets one marker styled by its aggregate severity, and
    /// the active filter is re-applied. Only the first location with a
    /// given id gets a marker.
    pub fn render(&mut self, data: MapData) -> RenderSummary {
        self.clear();

        let MapData { locations, reports } = data;
        let (grouped, orphan_reports) = group_reports(reports);
        if orphan_reports > 0 {
            log::debug!("Dropped {orphan_reports} reports with no location");
        }
        log::debug!("{} locations have reports", grouped.len());
        self.reports_by_location = grouped;

        let mut skipped_locations = 0;
        let mut placed = BTreeSet::new();
        for location in &locations {
            let Some(marker) = self.build_marker(location) else {
                skipped_locations += 1;
                continue;
            };
            if !placed.insert(marker.location_id) {
                log::warn!(
                    "Skipping duplicate location {} ({})",
                    marker.location_id,
                    marker.name
                );
                skipped_locations += 1;
                continue;
            }
            self.layer.add(marker);
        }

        self.layer.apply_filter(self.filter);

        let summary = RenderSummary {
            markers: self.layer.len(),
            skipped_locations,
            orphan_reports,
        };
        log::info!(
            "Markers added: {} ({} locations skipped)",
            summary.markers,
            summary.skipped_locations
        );
        summary
    }

    /// Shows only markers matching `filter`. No data is re-fetched.
    pub fn apply_filter(&mut self, filter: SeverityFilter) {
        self.filter = filter;
        self.layer.apply_filter(filter);
    }

    /// Detail view for one location, if it has a marker.
    #[must_use]
    pub fn detail(&self, location_id: i64) -> Option<LocationDetail> {
        let marker = self.layer.get(location_id)?;
        let reports = self
            .reports_by_location
            .get(&location_id)
            .map_or(&[][..], Vec::as_slice);
        Some(LocationDetail::new(marker, reports))
    }

    /// Exports the layer as `GeoJSON`.
    #[must_use]
    pub fn to_geojson(&self) -> FeatureCollection {
        self.layer.to_geojson(&self.config)
    }

    /// Drops all markers and grouped reports.
    pub fn clear(&mut self) {
        self.layer.clear();
        self.reports_by_location.clear();
    }

    fn build_marker(&self, location: &ApiLocation) -> Option<Marker> {
        let Some(location_id) = location.location_id else {
            log::warn!("Skipping location without an id: {:?}", location.city_name);
            return None;
        };

        let (Some(lat), Some(lon)) = (location.latitude(), location.longitude()) else {
            log::debug!("Skipping location {location_id}: missing or invalid coordinates");
            return None;
        };

        let reports = self
            .reports_by_location
            .get(&location_id)
            .map_or(&[][..], Vec::as_slice);

        let (severity, report_count) = match self.config.severity_source {
            SeveritySource::Reports => (
                aggregate(reports.iter().map(ApiReport::severity_label)),
                reports.len(),
            ),
            SeveritySource::Server => (
                location.server_severity().unwrap_or(Severity::Low),
                location
                    .total_reports
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(reports.len()),
            ),
        };

        Some(Marker {
            location_id,
            name: location
                .city_name
                .clone()
                .unwrap_or_else(|| format!("Location {location_id}")),
            location_type: location.location_type.clone(),
            position: LatLng { lat, lon },
            severity,
            report_count,
            visible: true,
            opacity: VISIBLE_OPACITY,
        })
    }
}

/// Groups reports by the location they belong to.
///
/// Returns the groups and the number of reports that named no location.
fn group_reports(reports: Vec<ApiReport>) -> (BTreeMap<i64, Vec<ApiReport>>, usize) {
    let mut grouped: BTreeMap<i64, Vec<ApiReport>> = BTreeMap::new();
    let mut orphans = 0;
    for report in reports {
        match report.location_id() {
            Some(id) => grouped.entry(id).or_default().push(report),
            None => orphans += 1,
        }
    }
    (grouped, orphans)
}
