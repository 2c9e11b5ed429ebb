//! Markers and the layer that owns them.

use ecowatch_severity_models::{Severity, SeverityFilter, SeverityStyle};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;

use crate::config::MapConfig;
use crate::popup::popup_html;

/// Opacity of a marker that passes the active filter.
pub const VISIBLE_OPACITY: f64 = 1.0;
/// Opacity of a marker hidden by the active filter.
pub const HIDDEN_OPACITY: f64 = 0.1;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// A map pin for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Location id.
    pub location_id: i64,
    /// Location display name.
    pub name: String,
    /// `city` or `municipality`, when known.
    pub location_type: Option<String>,
    /// Where the pin sits.
    pub position: LatLng,
    /// Aggregate severity of the location.
    pub severity: Severity,
    /// Number of reports counted for the popup.
    pub report_count: usize,
    /// Whether the active filter shows this marker.
    pub visible: bool,
    /// Current opacity.
    pub opacity: f64,
}

impl Marker {
    /// Style looked up from the marker's severity.
    #[must_use]
    pub const fn style(&self) -> SeverityStyle {
        self.severity.style()
    }

    /// Shows or hides the marker according to `filter`.
    pub fn apply_filter(&mut self, filter: SeverityFilter) {
        self.visible = filter.matches(self.severity);
        self.opacity = if self.visible {
            VISIBLE_OPACITY
        } else {
            HIDDEN_OPACITY
        };
    }

    fn to_feature(&self, config: &MapConfig) -> Feature {
        let style = self.style();
        let mut properties = JsonObject::new();
        properties.insert("id".into(), self.location_id.into());
        properties.insert("name".into(), self.name.clone().into());
        properties.insert("severity".into(), self.severity.to_string().into());
        properties.insert("color".into(), style.color.into());
        properties.insert("glyph".into(), style.glyph.into());
        properties.insert("reportCount".into(), self.report_count.into());
        properties.insert("visible".into(), self.visible.into());
        properties.insert("opacity".into(), self.opacity.into());
        properties.insert("popup".into(), popup_html(self, config).into());

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![
                self.position.lon,
                self.position.lat,
            ]))),
            id: Some(geojson::feature::Id::Number(self.location_id.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// The renderer-owned marker collection.
///
/// Rebuilt from scratch on every load; filtering only flips visibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    /// Adds a marker.
    pub fn add(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    /// Removes every marker.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Number of markers, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the layer holds no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// All markers in insertion order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Markers that pass the active filter.
    pub fn visible(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.visible)
    }

    /// The marker for a location.
    #[must_use]
    pub fn get(&self, location_id: i64) -> Option<&Marker> {
        self.markers.iter().find(|m| m.location_id == location_id)
    }

    /// Applies `filter` to every marker.
    pub fn apply_filter(&mut self, filter: SeverityFilter) {
        for marker in &mut self.markers {
            marker.apply_filter(filter);
        }
    }

    /// Exports every marker as a `GeoJSON` point feature.
    #[must_use]
    pub fn to_geojson(&self, config: &MapConfig) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.markers.iter().map(|m| m.to_feature(config)).collect(),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: i64, severity: Severity) -> Marker {
        Marker {
            location_id: id,
            name: format!("Location {id}"),
            location_type: None,
            position: LatLng {
                lat: 13.9,
                lon: 121.1,
            },
            severity,
            report_count: 2,
            visible: true,
            opacity: VISIBLE_OPACITY,
        }
    }

    #[test]
    fn filter_toggles_opacity_without_removing() {
        let mut layer = MarkerLayer::default();
        layer.add(marker(1, Severity::Critical));
        layer.add(marker(2, Severity::Low));

        layer.apply_filter(SeverityFilter::Only(Severity::Critical));
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.visible().count(), 1);
        let hidden = layer.get(2).unwrap();
        assert!(!hidden.visible);
        assert!((hidden.opacity - HIDDEN_OPACITY).abs() < f64::EPSILON);

        layer.apply_filter(SeverityFilter::All);
        assert_eq!(layer.visible().count(), 2);
        assert!((layer.get(2).unwrap().opacity - VISIBLE_OPACITY).abs() < f64::EPSILON);
    }

    #[test]
    fn geojson_features_are_lon_lat_points() {
        let mut layer = MarkerLayer::default();
        layer.add(marker(7, Severity::High));

        let collection = layer.to_geojson(&MapConfig::default());
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        let Some(Geometry {
            value: Value::Point(coords),
            ..
        }) = &feature.geometry
        else {
            panic!("expected a point geometry");
        };
        assert_eq!(coords, &vec![121.1, 13.9]);

        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["severity"], "High");
        assert_eq!(props["color"], "#E0790B");
        assert_eq!(props["reportCount"], 2);
        assert!(props["popup"].as_str().unwrap().contains("Location 7"));
    }

    #[test]
    fn empty_layer_exports_empty_collection() {
        let layer = MarkerLayer::default();
        assert!(layer.is_empty());
        let text = geojson::GeoJson::from(layer.to_geojson(&MapConfig::default())).to_string();
        assert!(text.contains("FeatureCollection"));
    }
}
