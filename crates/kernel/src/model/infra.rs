use super::{FeatureCollection, FeatureId, LineGeometry, deserialize_opt_id, deserialize_year};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Properties of a cycling-infrastructure segment. Serialized back under
/// the source property names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfraProperties {
    #[serde(rename = "nom", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "commune1", skip_serializing_if = "Option::is_none")]
    pub commune: Option<String>,

    /// Type of amenity (`Piste Cyclable`, `Voie verte`, ...).
    #[serde(rename = "typeamenagement", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Network tier.
    #[serde(rename = "reseau", skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(rename = "senscirculation", skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    /// `None` means undated: shown for every year.
    #[serde(
        rename = "anneelivraison",
        deserialize_with = "deserialize_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_year: Option<i32>,

    /// Length in meters.
    #[serde(rename = "longueur", skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,

    /// Global score, all years combined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_scores: Option<BTreeMap<i32, Option<f64>>>,

    #[serde(
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub amenagement_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfraFeature {
    pub id: String,
    pub geometry: LineGeometry,
    pub properties: InfraProperties,
}

impl InfraFeature {
    pub fn new(id: impl Into<String>, geometry: LineGeometry, properties: InfraProperties) -> Self {
        Self {
            id: id.into(),
            geometry,
            properties,
        }
    }

    pub fn delivery_year(&self) -> Option<i32> {
        self.properties.delivery_year
    }

    /// Embedded score for `year`, if any.
    pub fn score_for(&self, year: i32) -> Option<f64> {
        self.properties
            .yearly_scores
            .as_ref()
            .and_then(|scores| scores.get(&year).copied().flatten())
    }

    pub fn bounding_rect(&self) -> Option<geo::Rect<f64>> {
        use geo::BoundingRect;
        self.geometry.to_geo().bounding_rect()
    }
}

#[derive(Debug, Deserialize)]
struct RawInfraFeature {
    #[serde(default)]
    id: Option<FeatureId>,
    #[serde(default)]
    geometry: Option<serde_json::Value>,
    #[serde(default)]
    properties: Option<serde_json::Value>,
}

impl RawInfraFeature {
    fn resolve(self) -> Option<InfraFeature> {
        let properties = match self.properties {
            Some(properties) => serde_json::from_value::<InfraProperties>(properties).ok()?,
            None => InfraProperties::default(),
        };
        let id = self
            .id
            .map(String::from)
            .or_else(|| properties.amenagement_id.clone())?;
        let geometry = serde_json::from_value::<LineGeometry>(self.geometry?).ok()?;
        Some(InfraFeature::new(id, geometry, properties))
    }
}

/// Parse the infrastructure FeatureCollection. Features without an id,
/// without a (Multi)LineString geometry or with unreadable properties are
/// skipped.
pub fn parse_infrastructure(bytes: &[u8]) -> Result<Vec<InfraFeature>, Error> {
    let collection: FeatureCollection<RawInfraFeature> = serde_json::from_slice(bytes)?;
    let total = collection.features.len();
    let features: Vec<_> = collection
        .features
        .into_iter()
        .filter_map(RawInfraFeature::resolve)
        .collect();

    if features.len() < total {
        warn!(
            skipped = total - features.len(),
            "skipped infrastructure features without id, line geometry or readable properties"
        );
    }
    debug!(count = features.len(), "infrastructure parsed");
    Ok(features)
}
