#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity map rendering for environmental report locations.
//!
//! A [`MapRenderer`] fetches locations and reports (both at once, joined
//! before rendering), computes each location's aggregate severity and
//! places one color-coded [`Marker`] per location with usable
//! coordinates. The marker layer is owned by the renderer and rebuilt on
//! every load; the severity filter only toggles marker visibility.
//!
//! The layer can be exported as `GeoJSON` ([`MapRenderer::to_geojson`]) or
//! as a standalone Leaflet page ([`render_page`]).

pub mod config;
pub mod detail;
pub mod marker;
pub mod page;
pub mod popup;
pub mod renderer;

pub use config::{ConfigError, MapConfig, SeveritySource};
pub use detail::{LocationDetail, ReportSummary, TierCount};
pub use marker::{HIDDEN_OPACITY, LatLng, Marker, MarkerLayer, VISIBLE_OPACITY};
pub use page::render_page;
pub use popup::popup_html;
pub use renderer::{MapRenderer, RenderSummary};
