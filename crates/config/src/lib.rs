#![forbid(unsafe_code)]

mod data;
mod error;
mod layers;
mod view;

pub use data::{Data, ScoreLoaderKind, Scores, SourceKind};
pub use error::Error;
pub use layers::{CellShape, InfraColoring, Layers, ProbabilityScheme, ScoreScheme, Tension};
pub use view::View;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables overriding the configuration, e.g.
/// `VELOMENAJ_DATA__ROOT=/srv/data`.
pub const ENV_PREFIX: &str = "VELOMENAJ_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: Data,
    pub view: View,
    pub layers: Layers,
}

impl Config {
    /// Defaults merged with the environment.
    pub fn new() -> Result<Self, Error> {
        let config: Self = Self::figment().extract().map_err(Box::new)?;
        Ok(config.clamp())
    }

    /// Load the configuration file at `path`, then apply environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Self::environment())
            .extract()
            .map_err(Box::new)?;
        Ok(config.clamp())
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml_edit::ser::to_string_pretty(self)?)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Self::environment())
    }

    fn environment() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn clamp(self) -> Self {
        Self {
            layers: self.layers.clamp(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn load_merges_file_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "velomenaj.toml",
                r#"
                [data]
                root = "/srv/velo"

                [data.scores]
                loader = "embedded"

                [view]
                default_year = 2020

                [layers]
                probability_scheme = "continuous"
                stats_top = 0

                [layers.prediction_cell]
                shape = "grid"
                lat_step = 0.003
                lon_step = 0.004
                "#,
            )?;

            let config = Config::load("velomenaj.toml").map_err(|err| err.to_string())?;
            assert_eq!(config.data.root, "/srv/velo");
            assert_eq!(config.data.infrastructure, "infra.json");
            assert_eq!(config.data.scores.loader, ScoreLoaderKind::Embedded);
            assert_eq!(config.view.default_year, Some(2020));
            assert_eq!(config.view.min_year, 2014);
            assert_eq!(
                config.layers.probability_scheme,
                ProbabilityScheme::Continuous
            );
            assert_eq!(config.layers.stats_top, 1);
            assert_eq!(
                config.layers.prediction_cell,
                CellShape::Grid {
                    lat_step: 0.003,
                    lon_step: 0.004
                }
            );
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("velomenaj.toml", "[view]\nmin_year = 2015\n")?;
            jail.set_env("VELOMENAJ_VIEW__MIN_YEAR", "2016");
            jail.set_env("VELOMENAJ_LAYERS__SCORE_SCHEME", "hsl");

            let config = Config::load("velomenaj.toml").map_err(|err| err.to_string())?;
            assert_eq!(config.view.min_year, 2016);
            assert_eq!(config.layers.score_scheme, ScoreScheme::Hsl);
            Ok(())
        });
    }

    #[test]
    fn new_reads_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("VELOMENAJ_DATA__ROOT", "/srv/velo");
            jail.set_env("VELOMENAJ_LAYERS__SCORE_SCHEME", "hsl");

            let config = Config::new().map_err(|err| err.to_string())?;
            assert_eq!(config.data.root, "/srv/velo");
            assert_eq!(config.layers.score_scheme, ScoreScheme::Hsl);
            Ok(())
        });
    }

    #[test]
    fn new_rejects_malformed_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("VELOMENAJ_DATA__ROOT", "/srv/velo");
            jail.set_env("VELOMENAJ_LAYERS__SCORE_SCHEME", "bogus");

            assert!(matches!(Config::new(), Err(Error::Figment(_))));
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(Config::load(&path), Err(Error::InvalidPath(p)) if p == path));
    }

    #[test]
    fn toml_dump_reloads_to_same_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.toml");
        let config = Config::default();
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
