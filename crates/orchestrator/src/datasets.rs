#![forbid(unsafe_code)]

use crate::error::Error;
use crate::source::DataSource;
use config::Data;
use kernel::model::{
    CountingSite, InfraFeature, PassageCounts, PredictionCell, parse_infrastructure,
    parse_predictions, parse_sites,
};
use kernel::stats::{StatRow, parse_stats};
use tracing::{info, warn};

/// Every static file the views are built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub infrastructure: Vec<InfraFeature>,
    pub sites: Vec<CountingSite>,
    pub passages: PassageCounts,
    pub predictions: Vec<PredictionCell>,
    /// `None` when no stats file could be read; the panel is then derived.
    pub stats: Option<Vec<StatRow>>,
}

impl Datasets {
    /// Fetch all files concurrently.
    ///
    /// Only the infrastructure file is required. Any other file that is
    /// missing or malformed is replaced by an empty dataset.
    pub async fn load(source: &dyn DataSource, data: &Data) -> Result<Self, Error> {
        let (infrastructure, sites, passages, predictions, stats) = tokio::join!(
            source.fetch(&data.infrastructure),
            optional(source, &data.counters, parse_sites),
            optional(source, &data.passages, PassageCounts::from_slice),
            optional(source, &data.predictions, parse_predictions),
            optional(source, &data.stats, parse_stats),
        );
        let infrastructure = parse_infrastructure(&infrastructure?)?;

        let datasets = Self {
            infrastructure,
            sites: sites.unwrap_or_default(),
            passages: passages.unwrap_or_default(),
            predictions: predictions.unwrap_or_default(),
            stats,
        };
        info!(
            source = %source.describe(),
            infrastructure = datasets.infrastructure.len(),
            sites = datasets.sites.len(),
            predictions = datasets.predictions.len(),
            stats = datasets.stats.as_ref().map(Vec::len),
            "datasets loaded"
        );
        Ok(datasets)
    }
}

async fn optional<T>(
    source: &dyn DataSource,
    name: &str,
    parse: fn(&[u8]) -> Result<T, kernel::Error>,
) -> Option<T> {
    let bytes = match source.fetch(name).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(file = name, %err, "optional data file unavailable");
            return None;
        }
    };
    match parse(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(file = name, %err, "optional data file is malformed");
            None
        }
    }
}
