use crate::error::Error;
use crate::signals::{SignalEvent, wait_for_signal};
use config::{Config, Layers};
use orchestrator::view::{derived_stats, stats_panel};
use orchestrator::{
    ControlEvent, DataSource, Datasets, LayerSet, ViewState, Viewer, score_loader_from_config,
    source_from_config,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration file (or defaults), environment, then the `--data-dir`
/// override.
pub fn load_config(conffile: Option<&Path>, data_dir: Option<&str>) -> Result<Config, Error> {
    let mut config = match conffile {
        Some(path) => Config::load(path)?,
        None => Config::new()?,
    };
    if let Some(root) = data_dir {
        config.data.root = root.to_owned();
    }
    Ok(config)
}

async fn open(config: &Config) -> Result<(Arc<dyn DataSource>, Datasets), Error> {
    let source = source_from_config(&config.data)?;
    let datasets = Datasets::load(source.as_ref(), &config.data).await?;
    Ok((source, datasets))
}

async fn open_viewer(config: &Config) -> Result<(Arc<dyn DataSource>, Viewer), Error> {
    let (source, datasets) = open(config).await?;
    let loader = score_loader_from_config(&config.data, Arc::clone(&source));
    Ok((source, Viewer::new(config.clone(), datasets, loader)))
}

/// Write every layer of `year` plus `stats.json` into `out`. Returns the
/// year actually rendered.
pub async fn render(config: &Config, year: Option<i32>, out: &Path) -> Result<i32, Error> {
    let (_, mut viewer) = open_viewer(config).await?;
    viewer.select_year(year.unwrap_or(viewer.year()));
    viewer.settle().await;

    let state = viewer.state();
    let view = state.view(&config.layers);
    let layers = LayerSet::from_view(&view)?;

    tokio::fs::create_dir_all(out)
        .await
        .map_err(|source| Error::Write {
            path: out.to_owned(),
            source,
        })?;
    for (name, collection) in layers.files() {
        write_file(out.join(name), serde_json::to_vec_pretty(collection)?).await?;
    }
    write_file(out.join("stats.json"), serde_json::to_vec_pretty(&view.stats)?).await?;

    info!(
        year = view.year,
        infrastructure = view.infrastructure.len(),
        unscored = view.unscored(),
        counters = view.counters.len(),
        predictions = view.predictions.len(),
        tension = view.tension.len(),
        out = %out.display(),
        "layers written"
    );
    Ok(view.year)
}

async fn write_file(path: PathBuf, contents: Vec<u8>) -> Result<(), Error> {
    tokio::fs::write(&path, contents)
        .await
        .map_err(|source| Error::Write { path, source })
}

/// Print the statistics panel rows.
pub async fn stats(
    config: &Config,
    top: Option<u16>,
    derive: bool,
    out: &mut impl Write,
) -> Result<(), Error> {
    let (_, datasets) = open(config).await?;
    let layers = Layers {
        stats_top: top.map_or(config.layers.stats_top, usize::from),
        ..config.layers.clone()
    };
    let rows = if derive {
        derived_stats(&datasets, &layers)
    } else {
        stats_panel(&datasets, &layers)
    };
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out).map_err(|source| Error::Write {
        path: PathBuf::from("-"),
        source,
    })
}

/// Print the effective configuration.
pub fn dump_config(config: &Config, out: &mut impl Write) -> Result<(), Error> {
    let toml = config.to_toml()?;
    out.write_all(toml.as_bytes())
        .map_err(|source| Error::Write {
            path: PathBuf::from("-"),
            source,
        })
}

/// A year typed on stdin, if the line holds one.
pub fn parse_year(line: &str) -> Option<i32> {
    line.trim().parse().ok()
}

/// Apply the years read from stdin until it closes or a shutdown signal
/// arrives.
pub async fn watch(config: &Config) -> Result<(), Error> {
    let (source, mut viewer) = open_viewer(config).await?;
    let mut states = viewer.subscribe();
    viewer.select_year(viewer.year());

    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let engine = tokio::spawn({
        let cancel = cancel.clone();
        async move { viewer.run_until(cancel, control_rx).await }
    });

    let (signals_tx, signals_rx) = flume::bounded(8);
    let mut signals = tokio::spawn(async move { wait_for_signal(&signals_tx).await });
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let outcome = loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("stdin closed");
                        break Ok(());
                    }
                    Err(err) => break Err(Error::Stdin(err)),
                };
                match parse_year(&line) {
                    Some(year) => {
                        if control_tx.send(ControlEvent::SelectYear(year)).is_err() {
                            break Ok(());
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!(input = %line, "not a year"),
                }
            }
            // a closed channel means the listener ended; its branch below reports why
            Ok(event) = signals_rx.recv_async() => {
                match event {
                    SignalEvent::Reload => match Datasets::load(source.as_ref(), &config.data).await {
                        Ok(datasets) => {
                            if control_tx.send(ControlEvent::Reload(datasets)).is_err() {
                                break Ok(());
                            }
                        }
                        Err(err) => warn!(%err, "reload failed, keeping current datasets"),
                    },
                    SignalEvent::Shutdown => {
                        info!("shutdown signal received");
                        break Ok(());
                    }
                }
            }
            joined = &mut signals => {
                break Err(signals_stopped(joined));
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = states.borrow_and_update().clone();
                report(&state, &config.layers);
            }
        }
    };

    cancel.cancel();
    signals.abort();
    engine.await?;
    outcome
}

/// Why the signal listener stopped. It only returns on failure.
fn signals_stopped(joined: Result<Result<(), Error>, JoinError>) -> Error {
    match joined {
        Ok(Err(err)) => err,
        Ok(Ok(())) => Error::RecvSignal(flume::RecvError::Disconnected),
        Err(err) => Error::Join(err),
    }
}

fn report(state: &ViewState, layers: &Layers) {
    if state.loading {
        debug!(year = state.year, "loading scores");
        return;
    }
    let view = state.view(layers);
    info!(
        year = view.year,
        scores_year = ?state.scores_year,
        infrastructure = view.infrastructure.len(),
        unscored = view.unscored(),
        counters = view.counters.len(),
        tension = view.tension.len(),
        "view applied"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("infra.json"),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","id":"a1",
                 "geometry":{"type":"LineString","coordinates":[[4.830,45.750],[4.832,45.752]]},
                 "properties":{"typeamenagement":"Piste Cyclable","anneelivraison":2018,"score":0.3}},
                {"type":"Feature","id":"a2",
                 "geometry":{"type":"LineString","coordinates":[[4.900,45.700],[4.901,45.701]]},
                 "properties":{"typeamenagement":"Voie verte","anneelivraison":2021,"score":0.8}}
            ]}"#,
        )
        .unwrap();
        fs::write(
            root.join("points_comptage.json"),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","id":"s1","geometry":{"type":"Point","coordinates":[4.831,45.751]},
                 "properties":{"site_name":"Quai Augagneur","avg_volume":240.0}}
            ]}"#,
        )
        .unwrap();
        fs::write(root.join("velo_par_annee.json"), r#"{"2019":{"s1":1200.0}}"#).unwrap();
        fs::create_dir(root.join("scores")).unwrap();
        fs::write(
            root.join("scores/2019.json"),
            r#"[{"amenagement_id":"a1","score":0.6}]"#,
        )
        .unwrap();
        dir
    }

    fn config(dir: &tempfile::TempDir) -> Config {
        load_config(None, dir.path().to_str()).unwrap()
    }

    #[tokio::test]
    async fn render_writes_every_layer() {
        let data = fixture();
        let out = tempfile::tempdir().unwrap();

        let year = render(&config(&data), Some(2019), out.path()).await.unwrap();
        assert_eq!(year, 2019);

        for name in [
            "infrastructure.geojson",
            "counters.geojson",
            "volumes.geojson",
            "predictions.geojson",
            "tension.geojson",
            "stats.json",
        ] {
            assert!(out.path().join(name).is_file(), "{name} missing");
        }

        let infra: serde_json::Value =
            serde_json::from_slice(&fs::read(out.path().join("infrastructure.geojson")).unwrap())
                .unwrap();
        let features = infra["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["year_score"], 0.6);

        let tension: serde_json::Value =
            serde_json::from_slice(&fs::read(out.path().join("tension.geojson")).unwrap()).unwrap();
        assert_eq!(tension["features"][0]["id"], "a1");
    }

    #[tokio::test]
    async fn render_defaults_to_latest_year() {
        let data = fixture();
        let out = tempfile::tempdir().unwrap();
        let year = render(&config(&data), None, out.path()).await.unwrap();
        assert_eq!(year, 2021);
    }

    #[tokio::test]
    async fn stats_are_derived_without_a_stats_file() {
        let data = fixture();
        let mut out = Vec::new();
        stats(&config(&data), Some(1), false, &mut out).await.unwrap();

        let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["typeamenagement"], "Voie verte");
    }

    #[test]
    fn config_dump_reflects_data_dir() {
        let config = load_config(None, Some("/srv/velo")).unwrap();
        let mut out = Vec::new();
        dump_config(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("root = \"/srv/velo\""));
    }

    #[test]
    fn blank_and_garbage_lines_are_not_years() {
        assert_eq!(parse_year(" 2019 \n"), Some(2019));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("twenty"), None);
    }

    #[tokio::test]
    async fn failed_signal_listener_reports_its_own_error() {
        let listener = tokio::spawn(async {
            Err::<(), _>(Error::SignalHandler(std::io::Error::other("denied")))
        });
        let err = signals_stopped(listener.await);
        assert!(matches!(err, Error::SignalHandler(_)), "{err}");
    }

    #[tokio::test]
    async fn panicked_signal_listener_is_a_join_error() {
        let listener = tokio::spawn(async {
            if true {
                panic!("listener died");
            }
            Ok::<(), Error>(())
        });
        assert!(matches!(signals_stopped(listener.await), Error::Join(_)));
    }

    proptest! {
        #[test]
        fn any_year_round_trips_through_a_line(year in any::<i32>(), pad in 0usize..4) {
            let line = format!("{}{year}{}", " ".repeat(pad), "\t".repeat(pad));
            prop_assert_eq!(parse_year(&line), Some(year));
        }
    }
}
