#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Severity tiers and aggregation rules for environmental reports.
//!
//! Every report filed against a location carries one of four ordered
//! severity tiers. A location's aggregate tier is derived from the mean
//! weight of its reports, and that tier drives how the location's marker
//! is styled on the map.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Mean weight at or above which a location is [`Severity::Critical`].
pub const CRITICAL_THRESHOLD: f64 = 3.5;
/// Mean weight at or above which a location is [`Severity::High`].
pub const HIGH_THRESHOLD: f64 = 2.5;
/// Mean weight at or above which a location is [`Severity::Medium`].
pub const MEDIUM_THRESHOLD: f64 = 1.5;

/// Severity tier of an environmental report, from 1 (low) to 4 (critical).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    /// Weight 1: minor or routine observations
    #[default]
    Low = 1,
    /// Weight 2: issues that need follow-up
    Medium = 2,
    /// Weight 3: significant environmental damage
    High = 3,
    /// Weight 4: urgent, ongoing harm
    Critical = 4,
}

impl Severity {
    /// All tiers in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the numeric weight used when averaging reports.
    #[must_use]
    pub const fn weight(self) -> u8 {
        self as u8
    }

    /// Parses a severity label such as `"Critical"`.
    ///
    /// Matching ignores ASCII case and surrounding whitespace. Returns
    /// `None` for anything that isn't one of the four tiers.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::from_str(label.trim()).ok()
    }

    /// Returns the weight of an optional label, falling back to the
    /// [`Severity::Low`] weight for missing or unrecognized values.
    #[must_use]
    pub fn weight_of(label: Option<&str>) -> u8 {
        label
            .and_then(Self::from_label)
            .unwrap_or(Self::Low)
            .weight()
    }

    /// Classifies a mean report weight into a tier.
    ///
    /// Each threshold is inclusive on its lower bound.
    #[must_use]
    pub fn classify(mean: f64) -> Self {
        if mean >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if mean >= HIGH_THRESHOLD {
            Self::High
        } else if mean >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the fixed marker style for this tier.
    #[must_use]
    pub const fn style(self) -> SeverityStyle {
        match self {
            Self::Critical => SeverityStyle {
                color: "#D92D2D",
                glyph: "!",
            },
            Self::High => SeverityStyle {
                color: "#E0790B",
                glyph: "▲",
            },
            Self::Medium => SeverityStyle {
                color: "#F7BE00",
                glyph: "●",
            },
            Self::Low => SeverityStyle {
                color: "#00A8A8",
                glyph: "○",
            },
        }
    }

    const fn index(self) -> usize {
        self as usize - 1
    }
}

/// Computes the aggregate tier for one location from its reports' labels.
///
/// Unrecognized and missing labels count with weight 1. An empty report
/// set aggregates to [`Severity::Low`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate<'a, I>(labels: I) -> Severity
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let (total, count) = labels
        .into_iter()
        .fold((0u64, 0u64), |(total, count), label| {
            (total + u64::from(Severity::weight_of(label)), count + 1)
        });

    if count == 0 {
        return Severity::Low;
    }

    Severity::classify(total as f64 / count as f64)
}

/// Display attributes of a severity tier on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityStyle {
    /// CSS color of the marker and the popup severity label.
    pub color: &'static str,
    /// Single glyph drawn inside the marker and next to the label.
    pub glyph: &'static str,
}

/// Which markers the map shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SeverityFilter {
    /// Every marker is visible.
    #[default]
    All,
    /// Only markers of the given tier are visible.
    Only(Severity),
}

impl SeverityFilter {
    /// Whether a marker with the given aggregate tier passes the filter.
    #[must_use]
    pub fn matches(self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::Only(tier) => tier == severity,
        }
    }
}

impl std::fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(tier) => write!(f, "{tier}"),
        }
    }
}

/// Error returned when a filter value is neither `All` nor a tier label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid severity filter '{value}': expected All, Low, Medium, High or Critical")]
pub struct InvalidSeverityFilterError {
    /// The rejected filter value.
    pub value: String,
}

impl FromStr for SeverityFilter {
    type Err = InvalidSeverityFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.is_empty() {
            return Ok(Self::All);
        }
        Severity::from_label(trimmed)
            .map(Self::Only)
            .ok_or_else(|| InvalidSeverityFilterError {
                value: s.to_string(),
            })
    }
}

/// Per-tier report counts for a single location.
///
/// Unrecognized labels are counted under [`Severity::Low`], matching the
/// weight they contribute to the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityBreakdown {
    counts: [usize; 4],
}

impl SeverityBreakdown {
    /// Tallies the given labels.
    #[must_use]
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut breakdown = Self::default();
        for label in labels {
            let tier = label.and_then(Severity::from_label).unwrap_or_default();
            breakdown.counts[tier.index()] += 1;
        }
        breakdown
    }

    /// Number of reports in the given tier.
    #[must_use]
    pub const fn count(&self, severity: Severity) -> usize {
        self.counts[severity.index()]
    }

    /// Total number of reports tallied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Iterates `(tier, count)` pairs from most to least severe.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, usize)> + '_ {
        Severity::ALL
            .iter()
            .rev()
            .map(|tier| (*tier, self.count(*tier)))
    }
}
