use super::{FeatureCollection, PointGeometry};
use crate::Error;
use crate::bounds::LatLng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A zone with an estimated success probability for new infrastructure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCell {
    #[serde(rename = "centroid_lat")]
    pub lat: f64,
    #[serde(rename = "centroid_lon")]
    pub lon: f64,
    #[serde(rename = "prob_success")]
    pub probability: f64,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl PredictionCell {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionsFile {
    Rows(Vec<Value>),
    Collection(FeatureCollection<PredictionFeature>),
}

#[derive(Debug, Deserialize)]
struct PredictionFeature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Value>,
}

impl PredictionFeature {
    fn resolve(self) -> Option<PredictionCell> {
        let position = serde_json::from_value::<PointGeometry>(self.geometry?)
            .ok()?
            .position();
        let properties = serde_json::from_value::<PredictionProperties>(self.properties?).ok()?;
        Some(PredictionCell {
            lat: position.lat,
            lon: position.lon,
            probability: properties.prob_success?,
            recommendation: properties.recommendation,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PredictionProperties {
    prob_success: Option<f64>,
    recommendation: Option<String>,
}

/// Parse prediction cells from either a plain array of rows or a GeoJSON
/// point collection. Rows and points without a usable position or
/// probability are dropped.
pub fn parse_predictions(bytes: &[u8]) -> Result<Vec<PredictionCell>, Error> {
    let (total, cells): (usize, Vec<_>) = match serde_json::from_slice(bytes)? {
        PredictionsFile::Rows(rows) => (
            rows.len(),
            rows.into_iter()
                .filter_map(|row| serde_json::from_value::<PredictionCell>(row).ok())
                .collect(),
        ),
        PredictionsFile::Collection(collection) => (
            collection.features.len(),
            collection
                .features
                .into_iter()
                .filter_map(PredictionFeature::resolve)
                .collect(),
        ),
    };

    if cells.len() < total {
        warn!(
            skipped = total - cells.len(),
            "skipped prediction cells without position or probability"
        );
    }
    debug!(count = cells.len(), "prediction cells parsed");
    Ok(cells)
}
