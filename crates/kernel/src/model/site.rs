use super::{FeatureCollection, FeatureId, PointGeometry, Position, deserialize_opt_id};
use crate::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProperties {
    /// Key into the passage-count table.
    #[serde(
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub site_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure_type: Option<String>,

    /// Mean hourly passages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountingSite {
    pub id: String,
    pub position: Position,
    pub properties: SiteProperties,
}

impl CountingSite {
    pub fn new(id: impl Into<String>, position: Position, properties: SiteProperties) -> Self {
        Self {
            id: id.into(),
            position,
            properties,
        }
    }

    /// Identifier used by the passage-count table.
    pub fn site_id(&self) -> &str {
        self.properties.site_id.as_deref().unwrap_or(&self.id)
    }

    pub fn name(&self) -> &str {
        self.properties.site_name.as_deref().unwrap_or(self.site_id())
    }
}

#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(default)]
    id: Option<FeatureId>,
    #[serde(default)]
    geometry: Option<serde_json::Value>,
    #[serde(default)]
    properties: Option<serde_json::Value>,
}

impl RawSite {
    fn resolve(self, index: usize) -> Option<CountingSite> {
        let position = serde_json::from_value::<PointGeometry>(self.geometry?)
            .ok()?
            .position();
        let properties = match self.properties {
            Some(properties) => serde_json::from_value::<SiteProperties>(properties).ok()?,
            None => SiteProperties::default(),
        };
        let id = self
            .id
            .map(String::from)
            .or_else(|| properties.site_id.clone())
            .unwrap_or_else(|| format!("site-{index}"));
        Some(CountingSite::new(id, position, properties))
    }
}

/// Parse the counting-site FeatureCollection. Sites without a point
/// geometry or with unreadable properties are skipped; sites without any
/// identifier get a positional one.
pub fn parse_sites(bytes: &[u8]) -> Result<Vec<CountingSite>, Error> {
    let collection: FeatureCollection<RawSite> = serde_json::from_slice(bytes)?;
    let total = collection.features.len();
    let sites: Vec<_> = collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| raw.resolve(index))
        .collect();

    if sites.len() < total {
        warn!(
            skipped = total - sites.len(),
            "skipped counting sites without point geometry or readable properties"
        );
    }
    debug!(count = sites.len(), "counting sites parsed");
    Ok(sites)
}
