//! Year-indexed score tables and the feature-id join.

use crate::Error;
use crate::color::{Style, amenity_color, score_color};
use crate::model::InfraFeature;
use crate::utils::clamp_unit;
use config::{InfraColoring, ScoreScheme};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of a per-year score file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub amenagement_id: String,
    pub score: f64,
}

/// Feature id to score, for a single year. Replaced as a whole whenever the
/// selected year changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap(HashMap<String, f64>);

impl ScoreMap {
    /// Parse a per-year score file (`[{amenagement_id, score}, ...]`).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let entries: Vec<ScoreEntry> = serde_json::from_slice(bytes)?;
        Ok(entries.into_iter().collect())
    }

    /// Scores embedded in the features for `year`. With `fallback_to_global`,
    /// features without a yearly entry use their global score.
    pub fn embedded(features: &[InfraFeature], year: i32, fallback_to_global: bool) -> Self {
        features
            .iter()
            .filter_map(|feature| {
                let score = feature.score_for(year).or_else(|| {
                    fallback_to_global
                        .then_some(feature.properties.score)
                        .flatten()
                })?;
                Some((feature.id.clone(), score))
            })
            .collect()
    }

    /// Score of `id`, clamped to `0.0..=1.0`.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied().map(clamp_unit)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Style of `feature`: colored by its score (or type), or the neutral
    /// no-data style when the year has no score for it.
    pub fn style_for(
        &self,
        feature: &InfraFeature,
        coloring: InfraColoring,
        scheme: ScoreScheme,
    ) -> Style {
        match self.get(&feature.id) {
            None => Style::NO_DATA,
            Some(score) => match coloring {
                InfraColoring::Score => Style::scored(score_color(score, scheme)),
                InfraColoring::Type => {
                    Style::scored(amenity_color(feature.properties.kind.as_deref()))
                }
            },
        }
    }
}

impl FromIterator<(String, f64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<ScoreEntry> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = ScoreEntry>>(iter: I) -> Self {
        iter.into_iter()
            .map(|entry| (entry.amenagement_id, entry.score))
            .collect()
    }
}
