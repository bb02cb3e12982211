//! Rows of the statistics panel.

use crate::Error;
use crate::model::{CountingSite, InfraFeature};
use crate::tension::{distance, is_near};
use geo::{BoundingRect, MultiLineString, Point, Rect};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Average score and volume of one infrastructure type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    #[serde(rename = "typeamenagement", alias = "category")]
    pub kind: String,
    pub avg_score: f64,
    pub avg_volume: f64,
}

pub fn parse_stats(bytes: &[u8]) -> Result<Vec<StatRow>, Error> {
    Ok(serde_json::from_slice(bytes)?)
}

/// The first `n` rows, in source order.
pub fn top_stats(rows: &[StatRow], n: usize) -> &[StatRow] {
    &rows[..n.min(rows.len())]
}

struct Candidate<'a> {
    kind: Option<&'a str>,
    score: f64,
    lines: MultiLineString<f64>,
    rect: Rect<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Derive the panel from the layers themselves.
///
/// Each counting site with a mean volume lends it to the nearest scored
/// segment within `radius_deg`. Per infrastructure type, `avg_score` averages
/// every scored segment and `avg_volume` averages the volumes lent to that
/// type (0 when none). Rows are sorted by descending score. Returns nothing
/// when no site could be matched to a segment.
pub fn efficiency_stats(
    features: &[InfraFeature],
    sites: &[CountingSite],
    radius_deg: f64,
) -> Vec<StatRow> {
    let candidates: Vec<Candidate<'_>> = features
        .iter()
        .filter_map(|feature| {
            let score = feature.properties.score?;
            let lines = feature.geometry.to_geo();
            let rect = lines.bounding_rect()?;
            Some(Candidate {
                kind: feature.properties.kind.as_deref(),
                score,
                lines,
                rect,
            })
        })
        .collect();

    let lent: Vec<(Option<&str>, f64)> = sites
        .par_iter()
        .filter_map(|site| {
            let volume = site.properties.avg_volume?;
            let point = Point::new(site.position.lon, site.position.lat);
            let nearest = candidates
                .iter()
                .filter(|candidate| is_near(&candidate.rect, site.position, radius_deg))
                .min_by(|a, b| distance(&a.lines, &point).total_cmp(&distance(&b.lines, &point)))?;
            Some((nearest.kind, volume))
        })
        .collect();

    debug!(matched = lent.len(), sites = sites.len(), "volumes lent to segments");
    if lent.is_empty() {
        return Vec::new();
    }

    let volumes = lent
        .into_iter()
        .filter_map(|(kind, volume)| Some((kind?, volume)))
        .into_group_map();

    candidates
        .iter()
        .filter_map(|candidate| Some((candidate.kind?, candidate.score)))
        .into_group_map()
        .into_iter()
        .map(|(kind, scores)| StatRow {
            kind: kind.to_owned(),
            avg_score: mean(&scores),
            avg_volume: volumes.get(kind).map_or(0.0, |v| mean(v)),
        })
        .sorted_by(|a, b| {
            b.avg_score
                .total_cmp(&a.avg_score)
                .then_with(|| a.kind.cmp(&b.kind))
        })
        .collect()
}
