#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Where the static data files are read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `root` is a local directory.
    #[default]
    Fs,
    /// `root` is a base URL.
    Http,
}

/// How per-year infrastructure scores are obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoreLoaderKind {
    /// One `<dir>/<year>.json` file per year.
    #[default]
    Files,
    /// `yearly_scores` carried by the infrastructure features themselves.
    Embedded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Scores {
    pub loader: ScoreLoaderKind,

    /// Directory (relative to `data.root`) holding the per-year score files.
    pub dir: String,

    /// Embedded loader only: use the global `score` when a feature has no
    /// entry for the selected year.
    pub fallback_to_global: bool,
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            loader: ScoreLoaderKind::Files,
            dir: "scores".into(),
            fallback_to_global: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Data {
    pub source: SourceKind,

    /// Data directory, or base URL when `source = "http"`.
    pub root: String,

    /// Infrastructure FeatureCollection. Mandatory.
    pub infrastructure: String,

    /// Counting-site FeatureCollection.
    pub counters: String,

    /// Year -> site id -> passage count table.
    pub passages: String,

    /// Prediction cells, plain array or GeoJSON points.
    pub predictions: String,

    /// Aggregate statistics for the chart panel.
    pub stats: String,

    pub scores: Scores,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            source: SourceKind::Fs,
            root: "data".into(),
            infrastructure: "infra.json".into(),
            counters: "points_comptage.json".into(),
            passages: "velo_par_annee.json".into(),
            predictions: "predictions_heatmap_lyon.json".into(),
            stats: "stats.json".into(),
            scores: Scores::default(),
        }
    }
}

impl Data {
    /// Relative location of the score file for `year`.
    pub fn score_file(&self, year: i32) -> String {
        let dir = self.scores.dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{year}.json")
        } else {
            format!("{dir}/{year}.json")
        }
    }
}
