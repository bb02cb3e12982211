#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Rendition of the continuous score gradient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScheme {
    /// Linear RGB blend between a fixed red and a fixed green.
    #[default]
    Rgb,
    /// Hue 0..120 at fixed saturation and lightness.
    Hsl,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityScheme {
    /// Four fixed buckets.
    #[default]
    Discrete,
    /// Red -> yellow -> green blend with a breakpoint at 0.5.
    Continuous,
}

/// What drives the color of an infrastructure segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InfraColoring {
    #[default]
    Score,
    Type,
}

/// Footprint drawn around a prediction cell centroid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum CellShape {
    /// Square with a physical side length.
    Square { side_meters: f64 },
    /// Fixed step in degrees.
    Grid { lat_step: f64, lon_step: f64 },
}

impl Default for CellShape {
    fn default() -> Self {
        Self::Square { side_meters: 300.0 }
    }
}

impl CellShape {
    /// Replace non-positive or non-finite sizes by the defaults.
    pub fn clamp(self) -> Self {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        match self {
            Self::Square { side_meters } if !valid(side_meters) => Self::default(),
            Self::Grid { lat_step, lon_step } => Self::Grid {
                lat_step: if valid(lat_step) { lat_step } else { 0.003 },
                lon_step: if valid(lon_step) { lon_step } else { 0.004 },
            },
            shape => shape,
        }
    }
}

/// Thresholds flagging high-volume sites next to low-score segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tension {
    /// Mean hourly passages above which a site counts as busy.
    pub min_volume: f64,
    /// Global score below which a segment counts as poor (clamped to 0..=1).
    pub max_score: f64,
    /// Search radius in degrees of latitude (clamped to 0..=0.1).
    pub radius_deg: f64,
}

impl Default for Tension {
    fn default() -> Self {
        Self {
            min_volume: 100.0,
            max_score: 0.5,
            radius_deg: 0.0005,
        }
    }
}

impl Tension {
    pub fn clamp(self) -> Self {
        let finite_or = |v: f64, d: f64| if v.is_finite() { v } else { d };
        let defaults = Self::default();
        Self {
            min_volume: finite_or(self.min_volume, defaults.min_volume).max(0.0),
            max_score: finite_or(self.max_score, defaults.max_score).clamp(0.0, 1.0),
            radius_deg: finite_or(self.radius_deg, defaults.radius_deg).clamp(0.0, 0.1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Layers {
    pub score_scheme: ScoreScheme,
    pub infra_coloring: InfraColoring,
    pub probability_scheme: ProbabilityScheme,

    /// Number of rows shown in the statistics panel (at least 1).
    pub stats_top: usize,

    pub tension: Tension,

    pub prediction_cell: CellShape,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            score_scheme: ScoreScheme::default(),
            infra_coloring: InfraColoring::default(),
            probability_scheme: ProbabilityScheme::default(),
            stats_top: 15,
            tension: Tension::default(),
            prediction_cell: CellShape::default(),
        }
    }
}

impl Layers {
    pub fn clamp(self) -> Self {
        Self {
            stats_top: self.stats_top.max(1),
            tension: self.tension.clamp(),
            prediction_cell: self.prediction_cell.clamp(),
            ..self
        }
    }
}
