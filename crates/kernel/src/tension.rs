//! Gap analysis: busy counting sites next to poorly scored segments.

use crate::model::{CountingSite, InfraFeature, Position};
use config::Tension;
use geo::{EuclideanDistance, MultiLineString, Point, Rect};
use rayon::prelude::*;
use tracing::debug;

/// The longitude margin is wider than the latitude one by this factor.
const LON_MARGIN_FACTOR: f64 = 1.5;

/// Whether `position` falls in `rect` grown by `radius` degrees of latitude
/// and `1.5 * radius` degrees of longitude.
pub(crate) fn is_near(rect: &Rect<f64>, position: Position, radius: f64) -> bool {
    let lon_margin = radius * LON_MARGIN_FACTOR;
    position.lat > rect.min().y - radius
        && position.lat < rect.max().y + radius
        && position.lon > rect.min().x - lon_margin
        && position.lon < rect.max().x + lon_margin
}

/// Distance in degrees from `point` to the closest part of `lines`.
pub(crate) fn distance(lines: &MultiLineString<f64>, point: &Point<f64>) -> f64 {
    lines
        .0
        .iter()
        .map(|line| point.euclidean_distance(line))
        .fold(f64::INFINITY, f64::min)
}

/// Segments scoring below `tension.max_score` that lie near a site whose mean
/// volume exceeds `tension.min_volume`. Each segment appears once, in input
/// order.
pub fn tension_zones<'a>(
    features: &'a [InfraFeature],
    sites: &[CountingSite],
    tension: &Tension,
) -> Vec<&'a InfraFeature> {
    let busy: Vec<Position> = sites
        .iter()
        .filter(|site| {
            site.properties
                .avg_volume
                .is_some_and(|volume| volume > tension.min_volume)
        })
        .map(|site| site.position)
        .collect();
    if busy.is_empty() {
        return Vec::new();
    }

    let zones: Vec<_> = features
        .par_iter()
        .filter(|feature| {
            feature
                .properties
                .score
                .is_some_and(|score| score < tension.max_score)
        })
        .filter(|feature| {
            feature.bounding_rect().is_some_and(|rect| {
                busy.iter()
                    .any(|position| is_near(&rect, *position, tension.radius_deg))
            })
        })
        .collect();

    debug!(busy_sites = busy.len(), zones = zones.len(), "tension zones");
    zones
}
