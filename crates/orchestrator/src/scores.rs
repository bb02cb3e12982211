#![forbid(unsafe_code)]

use crate::datasets::Datasets;
use crate::error::Error;
use crate::source::DataSource;
use async_trait::async_trait;
use config::{Data, ScoreLoaderKind};
use kernel::ScoreMap;
use std::sync::Arc;
use tracing::debug;

/// Produces the score table of one year.
#[async_trait]
pub trait ScoreLoader: Send + Sync {
    async fn load(&self, year: i32, datasets: &Datasets) -> Result<ScoreMap, Error>;
}

pub fn score_loader_from_config(
    data: &Data,
    source: Arc<dyn DataSource>,
) -> Arc<dyn ScoreLoader> {
    match data.scores.loader {
        ScoreLoaderKind::Files => Arc::new(FileScoreLoader::new(source, data.clone())),
        ScoreLoaderKind::Embedded => {
            Arc::new(EmbeddedScoreLoader::new(data.scores.fallback_to_global))
        }
    }
}

/// Reads `<scores dir>/<year>.json` through the data source.
pub struct FileScoreLoader {
    source: Arc<dyn DataSource>,
    data: Data,
}

impl FileScoreLoader {
    pub fn new(source: Arc<dyn DataSource>, data: Data) -> Self {
        Self { source, data }
    }
}

#[async_trait]
impl ScoreLoader for FileScoreLoader {
    async fn load(&self, year: i32, _datasets: &Datasets) -> Result<ScoreMap, Error> {
        let name = self.data.score_file(year);
        let bytes = self.source.fetch(&name).await?;
        let scores = ScoreMap::from_slice(&bytes)?;
        debug!(year, file = %name, entries = scores.len(), "score file loaded");
        Ok(scores)
    }
}

/// Uses the `yearly_scores` carried by the infrastructure features.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedScoreLoader {
    fallback_to_global: bool,
}

impl EmbeddedScoreLoader {
    pub fn new(fallback_to_global: bool) -> Self {
        Self { fallback_to_global }
    }
}

#[async_trait]
impl ScoreLoader for EmbeddedScoreLoader {
    async fn load(&self, year: i32, datasets: &Datasets) -> Result<ScoreMap, Error> {
        Ok(ScoreMap::embedded(
            &datasets.infrastructure,
            year,
            self.fallback_to_global,
        ))
    }
}
