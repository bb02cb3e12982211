//! Value-to-color mappers for every layer.
//!
//! All mappers are total: inputs are clamped (scores, probabilities) or
//! bucketed (volumes), never rejected.

use crate::utils::{clamp_unit, lerp_channel};
use config::{ProbabilityScheme, ScoreScheme};
use serde::{Serialize, Serializer};
use std::fmt;

/// A CSS color value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Hex(&'static str),
    Rgb(u8, u8, u8),
    Hsl {
        hue: f64,
        saturation: u8,
        lightness: u8,
    },
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex(hex) => f.write_str(hex),
            Self::Rgb(r, g, b) => write!(f, "rgb({r}, {g}, {b})"),
            Self::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({hue}, {saturation}%, {lightness}%)"),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Line style of an infrastructure segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Style {
    pub color: Color,
    pub weight: f32,
    pub opacity: f32,
}

impl Style {
    /// Segments without a score for the selected year.
    pub const NO_DATA: Self = Self {
        color: Color::Hex(NO_DATA_COLOR),
        weight: 2.0,
        opacity: 0.5,
    };

    pub fn scored(color: Color) -> Self {
        Self {
            color,
            weight: 3.0,
            opacity: 0.8,
        }
    }

    pub fn is_no_data(&self) -> bool {
        *self == Self::NO_DATA
    }
}

pub const NO_DATA_COLOR: &str = "#6b7280";

/// Score 0 end of the RGB gradient.
pub const SCORE_LOW: (u8, u8, u8) = (239, 68, 68);
/// Score 1 end of the RGB gradient.
pub const SCORE_HIGH: (u8, u8, u8) = (34, 197, 94);

const HSL_SATURATION: u8 = 80;
const HSL_LIGHTNESS: u8 = 45;

/// Linear blend from [`SCORE_LOW`] to [`SCORE_HIGH`].
pub fn score_rgb(score: f64) -> Color {
    let s = clamp_unit(score);
    Color::Rgb(
        lerp_channel(SCORE_LOW.0, SCORE_HIGH.0, s),
        lerp_channel(SCORE_LOW.1, SCORE_HIGH.1, s),
        lerp_channel(SCORE_LOW.2, SCORE_HIGH.2, s),
    )
}

/// Hue 0 (red) to 120 (green).
pub fn score_hsl(score: f64) -> Color {
    Color::Hsl {
        hue: clamp_unit(score) * 120.0,
        saturation: HSL_SATURATION,
        lightness: HSL_LIGHTNESS,
    }
}

pub fn score_color(score: f64, scheme: ScoreScheme) -> Color {
    match scheme {
        ScoreScheme::Rgb => score_rgb(score),
        ScoreScheme::Hsl => score_hsl(score),
    }
}

/// Volume bands, highest first. A volume lands in the first band whose
/// threshold it strictly exceeds.
pub const VOLUME_BUCKETS: [(f64, &str); 5] = [
    (200.0, "#800026"),
    (100.0, "#BD0026"),
    (50.0, "#E31A1C"),
    (20.0, "#FC4E2A"),
    (10.0, "#FD8D3C"),
];
pub const VOLUME_FLOOR: &str = "#FEB24C";

pub fn volume_color(volume: f64) -> Color {
    VOLUME_BUCKETS
        .iter()
        .find(|(threshold, _)| volume > *threshold)
        .map_or(Color::Hex(VOLUME_FLOOR), |(_, hex)| Color::Hex(*hex))
}

pub const PROBABILITY_BUCKETS: [(f64, &str); 3] =
    [(0.8, "#1a9850"), (0.6, "#91cf60"), (0.4, "#fee08b")];
pub const PROBABILITY_FLOOR: &str = "#d73027";

pub fn probability_bucket(probability: f64) -> Color {
    let p = clamp_unit(probability);
    PROBABILITY_BUCKETS
        .iter()
        .find(|(threshold, _)| p > *threshold)
        .map_or(Color::Hex(PROBABILITY_FLOOR), |(_, hex)| Color::Hex(*hex))
}

/// Red to yellow below 0.5, yellow to green above.
pub fn probability_rgb(probability: f64) -> Color {
    let p = clamp_unit(probability);
    if p < 0.5 {
        Color::Rgb(255, lerp_channel(0, 255, p * 2.0), 0)
    } else {
        Color::Rgb(lerp_channel(255, 0, (p - 0.5) * 2.0), 255, 0)
    }
}

pub fn probability_color(probability: f64, scheme: ProbabilityScheme) -> Color {
    match scheme {
        ProbabilityScheme::Discrete => probability_bucket(probability),
        ProbabilityScheme::Continuous => probability_rgb(probability),
    }
}

const AMENITY_COLORS: [(&str, &str); 8] = [
    ("Piste Cyclable", "#22c55e"),
    ("Bande Cyclable", "#3b82f6"),
    ("Voie verte", "#10b981"),
    ("Double sens cyclable", "#f59e0b"),
    ("Couloir bus vélo non élargi", "#8b5cf6"),
    ("Couloir bus vélo élargi", "#a855f7"),
    ("Chaussée à voie centrale banalisée (CVCB)", "#ec4899"),
    ("Goulotte ou rampe", "#6b7280"),
];

/// Color of an infrastructure type (`typeamenagement`).
pub fn amenity_color(kind: Option<&str>) -> Color {
    kind.and_then(|kind| AMENITY_COLORS.iter().find(|(name, _)| *name == kind))
        .map_or(Color::Hex(NO_DATA_COLOR), |(_, hex)| Color::Hex(*hex))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendSection {
    pub title: &'static str,
    pub entries: Vec<LegendEntry>,
}

/// Legend for the score, volume and probability layers.
pub fn legend(score: ScoreScheme, probability: ProbabilityScheme) -> Vec<LegendSection> {
    let entry = |label: String, color: Color| LegendEntry { label, color };

    let score_entries = vec![
        entry("0".into(), score_color(0.0, score)),
        entry("1".into(), score_color(1.0, score)),
        entry("no data".into(), Color::Hex(NO_DATA_COLOR)),
    ];

    let mut volume_entries: Vec<_> = VOLUME_BUCKETS
        .iter()
        .map(|(threshold, hex)| entry(format!("> {threshold} /h"), Color::Hex(*hex)))
        .collect();
    volume_entries.push(entry("≤ 10 /h".into(), Color::Hex(VOLUME_FLOOR)));

    let probability_entries = match probability {
        ProbabilityScheme::Discrete => {
            let mut entries: Vec<_> = PROBABILITY_BUCKETS
                .iter()
                .map(|(threshold, hex)| {
                    entry(format!("> {:.0}%", threshold * 100.0), Color::Hex(*hex))
                })
                .collect();
            entries.push(entry("≤ 40%".into(), Color::Hex(PROBABILITY_FLOOR)));
            entries
        }
        ProbabilityScheme::Continuous => [0.0, 0.5, 1.0]
            .into_iter()
            .map(|p| entry(format!("{:.0}%", p * 100.0), probability_rgb(p)))
            .collect(),
    };

    vec![
        LegendSection {
            title: "Score",
            entries: score_entries,
        },
        LegendSection {
            title: "Volume",
            entries: volume_entries,
        },
        LegendSection {
            title: "Probability",
            entries: probability_entries,
        },
    ]
}
