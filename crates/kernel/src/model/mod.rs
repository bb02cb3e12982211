//! Typed view of the static data files.

mod geometry;
mod infra;
mod passages;
mod prediction;
mod site;

pub use geometry::{LineGeometry, PointGeometry, Position};
pub use infra::{InfraFeature, InfraProperties, parse_infrastructure};
pub use passages::PassageCounts;
pub use prediction::{PredictionCell, parse_predictions};
pub use site::{CountingSite, SiteProperties, parse_sites};

use serde::{Deserialize, Deserializer};

/// GeoJSON `FeatureCollection` envelope. Only `features` is read.
#[derive(Debug, Deserialize)]
struct FeatureCollection<F> {
    features: Vec<F>,
}

/// GeoJSON feature ids may be strings or numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FeatureId {
    Text(String),
    Number(serde_json::Number),
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        match id {
            FeatureId::Text(text) => text,
            FeatureId::Number(number) => number.to_string(),
        }
    }
}

/// Accept `2018`, `2018.0` and `null` as a year.
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|year| year.is_finite() && year.fract() == 0.0)
        .map(|year| year as i32))
}

/// Accept string or numeric identifiers.
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FeatureId>::deserialize(deserializer)?.map(String::from))
}
