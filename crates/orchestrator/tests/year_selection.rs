#![forbid(unsafe_code)]

use async_trait::async_trait;
use config::Config;
use kernel::ScoreMap;
use kernel::model::{InfraFeature, InfraProperties, LineGeometry, Position};
use orchestrator::{ControlEvent, Datasets, Error, ScoreLoader, Viewer};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Answers after a per-year delay with a single `seg-<year>` score.
#[derive(Default)]
struct DelayedLoader {
    delays: HashMap<i32, Duration>,
    failing: HashSet<i32>,
    panicking: HashSet<i32>,
    calls: AtomicUsize,
}

impl DelayedLoader {
    fn with_delays(delays: &[(i32, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|&(year, ms)| (year, Duration::from_millis(ms)))
                .collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreLoader for DelayedLoader {
    async fn load(&self, year: i32, _datasets: &Datasets) -> Result<ScoreMap, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.get(&year).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        if self.panicking.contains(&year) {
            panic!("scores for {year} are corrupt");
        }
        if self.failing.contains(&year) {
            return Err(Error::InvalidUrl(format!("scores/{year}.json")));
        }
        Ok([(format!("seg-{year}"), 0.5)].into_iter().collect())
    }
}

fn datasets(latest: i32) -> Datasets {
    let infrastructure = (2018..=latest)
        .map(|year| {
            InfraFeature::new(
                format!("seg-{year}"),
                LineGeometry::LineString(vec![
                    Position::new(4.83, 45.75),
                    Position::new(4.84, 45.76),
                ]),
                InfraProperties {
                    delivery_year: Some(year),
                    ..Default::default()
                },
            )
        })
        .collect();
    Datasets {
        infrastructure,
        ..Default::default()
    }
}

fn viewer(loader: &Arc<DelayedLoader>) -> Viewer {
    Viewer::new(Config::default(), datasets(2022), loader.clone())
}

#[tokio::test(start_paused = true)]
async fn later_selection_wins_when_it_resolves_first() {
    let loader = Arc::new(DelayedLoader::with_delays(&[(2019, 500), (2021, 10)]));
    let mut viewer = viewer(&loader);

    viewer.select_year(2019);
    let latest = viewer.select_year(2021);
    viewer.settle().await;

    let state = viewer.state();
    assert_eq!(state.year, 2021);
    assert_eq!(state.generation, latest);
    assert_eq!(state.scores_year, Some(2021));
    assert_eq!(state.scores.get("seg-2021"), Some(0.5));
    assert_eq!(state.scores.get("seg-2019"), None);
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn later_selection_wins_when_it_resolves_last() {
    let loader = Arc::new(DelayedLoader::with_delays(&[(2019, 10), (2021, 500)]));
    let mut viewer = viewer(&loader);

    viewer.select_year(2019);
    // let the first load finish and report before the second selection
    tokio::time::sleep(Duration::from_millis(50)).await;
    viewer.select_year(2021);
    viewer.settle().await;

    let state = viewer.state();
    assert_eq!(state.year, 2021);
    assert_eq!(state.scores_year, Some(2021));
    assert_eq!(state.scores.get("seg-2019"), None);
    assert_eq!(loader.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_load_shows_no_data() {
    let loader = Arc::new(DelayedLoader {
        failing: HashSet::from([2020]),
        ..Default::default()
    });
    let mut viewer = viewer(&loader);

    viewer.select_year(2021);
    viewer.settle().await;
    assert_eq!(viewer.state().scores.len(), 1);

    viewer.select_year(2020);
    assert!(viewer.state().loading);
    viewer.settle().await;

    let state = viewer.state();
    assert_eq!(state.year, 2020);
    assert!(state.scores.is_empty());
    assert_eq!(state.scores_year, None);
    assert!(!state.loading);

    let view = state.view(&viewer.config().layers);
    assert_eq!(view.unscored(), view.infrastructure.len());
}

#[tokio::test(start_paused = true)]
async fn reselecting_loaded_year_does_not_fetch() {
    let loader = Arc::new(DelayedLoader::default());
    let mut viewer = viewer(&loader);

    viewer.select_year(2021);
    viewer.settle().await;
    assert_eq!(loader.calls(), 1);

    viewer.select_year(2021);
    assert!(!viewer.is_loading());
    assert!(viewer.state().is_settled());
    assert_eq!(loader.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn selections_are_clamped() {
    let loader = Arc::new(DelayedLoader::default());
    let mut viewer = viewer(&loader);
    assert_eq!(viewer.year(), 2022);
    assert_eq!(viewer.range().min, 2014);

    viewer.select_year(1990);
    assert_eq!(viewer.year(), 2014);
    viewer.select_year(2100);
    assert_eq!(viewer.year(), 2022);

    let mut config = Config::default();
    config.view.default_year = Some(2019);
    let viewer = Viewer::new(config, datasets(2022), loader.clone());
    assert_eq!(viewer.year(), 2019);
}

#[tokio::test(start_paused = true)]
async fn run_loop_serves_control_events() {
    let loader = Arc::new(DelayedLoader::with_delays(&[(2019, 300), (2021, 20)]));
    let mut viewer = viewer(&loader);
    let mut states = viewer.subscribe();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let engine = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            viewer.run_until(cancel, control_rx).await;
            viewer
        }
    });

    control_tx.send(ControlEvent::SelectYear(2019)).unwrap();
    control_tx.send(ControlEvent::SelectYear(2021)).unwrap();
    let state = states
        .wait_for(|state| state.year == 2021 && state.is_settled())
        .await
        .unwrap()
        .clone();
    assert_eq!(state.scores.get("seg-2021"), Some(0.5));

    control_tx.send(ControlEvent::Reload(datasets(2023))).unwrap();
    states
        .wait_for(|state| state.datasets.infrastructure.len() == 6 && state.is_settled())
        .await
        .unwrap();

    cancel.cancel();
    let viewer = engine.await.unwrap();
    assert_eq!(viewer.range().max, 2023);
    assert_eq!(viewer.year(), 2021);
    assert!(loader.calls() >= 2);
}

#[tokio::test(start_paused = true)]
async fn run_loop_survives_a_panicking_load() {
    let loader = Arc::new(DelayedLoader {
        panicking: HashSet::from([2020]),
        ..Default::default()
    });
    let mut viewer = viewer(&loader);
    let mut states = viewer.subscribe();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let engine = tokio::spawn({
        let cancel = cancel.clone();
        async move { viewer.run_until(cancel, control_rx).await }
    });

    control_tx.send(ControlEvent::SelectYear(2021)).unwrap();
    states
        .wait_for(|state| state.year == 2021 && state.is_settled())
        .await
        .unwrap();

    control_tx.send(ControlEvent::SelectYear(2020)).unwrap();
    let state = states
        .wait_for(|state| state.year == 2020 && !state.loading)
        .await
        .unwrap()
        .clone();
    assert!(state.scores.is_empty());
    assert_eq!(state.scores_year, None);

    control_tx.send(ControlEvent::SelectYear(2019)).unwrap();
    let state = states
        .wait_for(|state| state.year == 2019 && state.is_settled())
        .await
        .unwrap()
        .clone();
    assert_eq!(state.scores.get("seg-2019"), Some(0.5));

    cancel.cancel();
    engine.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn settle_survives_a_panicking_load() {
    let loader = Arc::new(DelayedLoader {
        panicking: HashSet::from([2020]),
        ..Default::default()
    });
    let mut viewer = viewer(&loader);

    viewer.select_year(2020);
    viewer.settle().await;

    let state = viewer.state();
    assert!(!state.loading);
    assert!(state.scores.is_empty());
    assert_eq!(state.scores_year, None);
}
