#![forbid(unsafe_code)]

use crate::error::Error;
use async_trait::async_trait;
use config::{Data, SourceKind};
use reqwest::Url;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the raw bytes of the file `name`, relative to the source root.
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, Error>;

    /// Human-readable location of the source, for logs.
    fn describe(&self) -> String;
}

/// Build the source described by the `[data]` section.
pub fn source_from_config(data: &Data) -> Result<Arc<dyn DataSource>, Error> {
    Ok(match data.source {
        SourceKind::Fs => Arc::new(FsSource::new(&data.root)),
        SourceKind::Http => Arc::new(HttpSource::new(&data.root)?),
    })
}

/// Files under a local directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Join `name` to the root. Absolute names and `..` components are
    /// rejected so lookups stay inside the data directory.
    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::InvalidPath(relative.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, Error> {
        let path = self.resolve(name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| Error::Read {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "read data file");
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Files served under a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: Url,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self, Error> {
        // without a trailing slash, `join` would replace the last segment
        let base = if base.ends_with('/') {
            base.to_owned()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&base).map_err(|err| Error::InvalidUrl(format!("{base}: {err}")))?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self { base, client })
    }

    fn resolve(&self, name: &str) -> Result<Url, Error> {
        self.base
            .join(name)
            .map_err(|err| Error::InvalidUrl(format!("{name}: {err}")))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, Error> {
        let url = self.resolve(name)?;
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(%url, bytes = bytes.len(), "fetched data file");
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
