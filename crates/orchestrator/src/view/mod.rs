#![forbid(unsafe_code)]

//! Styled layers for one selected year.
//!
//! A [`View`] borrows the static datasets and carries everything a map widget
//! needs to draw them: visible features, their styles and colors, cell
//! bounds, the tension overlay, the statistics panel and the legend.

pub mod export;

use crate::datasets::Datasets;
use config::Layers;
use kernel::ScoreMap;
use kernel::activity::{marker_hue, score_sites};
use kernel::bounds::{Bounds, cell_bounds};
use kernel::color::{
    Color, LegendSection, Style, legend, probability_color, score_color, volume_color,
};
use kernel::filter::{delivered_by, is_delivered_by};
use kernel::model::{CountingSite, InfraFeature, PredictionCell};
use kernel::stats::{StatRow, efficiency_stats, top_stats};
use kernel::tension::tension_zones;

#[derive(Debug, Clone, PartialEq)]
pub struct InfraView<'a> {
    pub feature: &'a InfraFeature,
    pub score: Option<f64>,
    pub style: Style,
}

/// A counting site scored against the mean of the selected year.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterView<'a> {
    pub site: &'a CountingSite,
    pub count: f64,
    pub score: f64,
    pub hue: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeView<'a> {
    pub site: &'a CountingSite,
    pub volume: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionView<'a> {
    pub cell: &'a PredictionCell,
    pub bounds: Bounds,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View<'a> {
    pub year: i32,
    pub infrastructure: Vec<InfraView<'a>>,
    pub counters: Vec<CounterView<'a>>,
    pub volumes: Vec<VolumeView<'a>>,
    pub predictions: Vec<PredictionView<'a>>,
    pub tension: Vec<&'a InfraFeature>,
    pub stats: Vec<StatRow>,
    pub legend: Vec<LegendSection>,
}

impl View<'_> {
    /// Number of visible segments that have no score for the year.
    pub fn unscored(&self) -> usize {
        self.infrastructure
            .iter()
            .filter(|infra| infra.score.is_none())
            .count()
    }
}

/// Assemble every layer for `year` from the datasets and that year's scores.
pub fn build_view<'a>(
    datasets: &'a Datasets,
    year: i32,
    scores: &ScoreMap,
    layers: &Layers,
) -> View<'a> {
    let infrastructure = delivered_by(&datasets.infrastructure, year)
        .into_iter()
        .map(|feature| InfraView {
            feature,
            score: scores.get(&feature.id),
            style: scores.style_for(feature, layers.infra_coloring, layers.score_scheme),
        })
        .collect();

    let counters = score_sites(&datasets.sites, &datasets.passages, year)
        .into_iter()
        .map(|activity| CounterView {
            site: activity.site,
            count: activity.count,
            score: activity.score,
            hue: marker_hue(activity.score),
            color: score_color(activity.score, layers.score_scheme),
        })
        .collect();

    let volumes = datasets
        .sites
        .iter()
        .filter_map(|site| {
            let volume = site.properties.avg_volume?;
            Some(VolumeView {
                site,
                volume,
                color: volume_color(volume),
            })
        })
        .collect();

    let predictions = datasets
        .predictions
        .iter()
        .map(|cell| PredictionView {
            cell,
            bounds: cell_bounds(cell.center(), layers.prediction_cell),
            color: probability_color(cell.probability, layers.probability_scheme),
        })
        .collect();

    let tension = tension_zones(&datasets.infrastructure, &datasets.sites, &layers.tension)
        .into_iter()
        .filter(|feature| is_delivered_by(feature, year))
        .collect();

    View {
        year,
        infrastructure,
        counters,
        volumes,
        predictions,
        tension,
        stats: stats_panel(datasets, layers),
        legend: legend(layers.score_scheme, layers.probability_scheme),
    }
}

/// Rows of the statistics panel: the shipped stats file when there is one,
/// otherwise derived from segments and counters.
pub fn stats_panel(datasets: &Datasets, layers: &Layers) -> Vec<StatRow> {
    match &datasets.stats {
        Some(rows) => top_stats(rows, layers.stats_top).to_vec(),
        None => derived_stats(datasets, layers),
    }
}

pub fn derived_stats(datasets: &Datasets, layers: &Layers) -> Vec<StatRow> {
    let mut rows = efficiency_stats(
        &datasets.infrastructure,
        &datasets.sites,
        layers.tension.radius_deg,
    );
    rows.truncate(layers.stats_top);
    rows
}
