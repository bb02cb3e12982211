#![forbid(unsafe_code)]

use crate::datasets::Datasets;
use crate::error::Error;
use crate::scores::ScoreLoader;
use crate::selection::{Generation, Selector};
use crate::view::{View, build_view};
use config::{Config, Layers};
use kernel::ScoreMap;
use kernel::filter::YearRange;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub enum ControlEvent {
    /// Switch to another year. Out-of-range years are clamped.
    SelectYear(i32),
    /// Replace the static datasets and reload the current year.
    Reload(Datasets),
}

/// Snapshot published after every change.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Selected year.
    pub year: i32,
    pub generation: Generation,
    pub scores: Arc<ScoreMap>,
    /// Year `scores` belong to. `None` before the first successful load and
    /// after a failed one.
    pub scores_year: Option<i32>,
    /// A score load for `year` is in flight.
    pub loading: bool,
    pub datasets: Arc<Datasets>,
}

impl ViewState {
    pub fn view(&self, layers: &Layers) -> View<'_> {
        build_view(&self.datasets, self.year, &self.scores, layers)
    }

    /// The scores shown belong to the selected year and nothing is pending.
    pub fn is_settled(&self) -> bool {
        !self.loading && self.scores_year == Some(self.year)
    }
}

struct Loaded {
    generation: Generation,
    year: i32,
    result: Result<ScoreMap, Error>,
}

/// Owns the selected year and its scores.
///
/// Every selection takes a new [`Generation`]. Score loads run as spawned
/// tasks and report back with the generation they were started for; only a
/// report matching the latest generation is applied, so the last selection
/// wins whatever order the loads finish in.
pub struct Viewer {
    config: Config,
    datasets: Arc<Datasets>,
    loader: Arc<dyn ScoreLoader>,
    range: YearRange,
    selector: Selector,
    year: i32,
    scores: Arc<ScoreMap>,
    scores_year: Option<i32>,
    in_flight: Option<JoinHandle<()>>,
    loaded_tx: mpsc::UnboundedSender<Loaded>,
    loaded_rx: mpsc::UnboundedReceiver<Loaded>,
    state_tx: watch::Sender<ViewState>,
}

impl Viewer {
    /// Create a viewer on the default year. Nothing is loaded until the
    /// first [`select_year`](Self::select_year).
    pub fn new(config: Config, datasets: Datasets, loader: Arc<dyn ScoreLoader>) -> Self {
        let range = YearRange::from_features(&datasets.infrastructure, config.view.min_year);
        let year = config
            .view
            .default_year
            .map_or(range.max, |year| range.clamp(year));
        let datasets = Arc::new(datasets);
        let scores = Arc::new(ScoreMap::default());
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ViewState {
            year,
            generation: Generation::default(),
            scores: Arc::clone(&scores),
            scores_year: None,
            loading: false,
            datasets: Arc::clone(&datasets),
        });
        info!(min = range.min, max = range.max, year, "viewer ready");

        Self {
            config,
            datasets,
            loader,
            range,
            selector: Selector::default(),
            year,
            scores,
            scores_year: None,
            in_flight: None,
            loaded_tx,
            loaded_rx,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.state_tx.borrow().clone()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Select `year` (clamped into the slider range).
    ///
    /// Any load still running for an earlier selection is aborted. When the
    /// scores of `year` are already held they are shown again at once.
    /// Must be called within a tokio runtime.
    pub fn select_year(&mut self, year: i32) -> Generation {
        let year = self.range.clamp(year);
        let generation = self.selector.next();
        self.year = year;

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }

        if self.scores_year == Some(year) {
            debug!(year, generation = generation.get(), "scores already loaded");
            self.publish();
            return generation;
        }

        let loader = Arc::clone(&self.loader);
        let datasets = Arc::clone(&self.datasets);
        let loaded_tx = self.loaded_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = loader.load(year, &datasets).await;
            // the receiver lives as long as the viewer
            let _ = loaded_tx.send(Loaded {
                generation,
                year,
                result,
            });
        }));
        debug!(year, generation = generation.get(), "score load started");
        self.publish();
        generation
    }

    /// Apply a finished load. Returns whether it was current.
    fn apply(&mut self, loaded: Loaded) -> bool {
        let Loaded {
            generation,
            year,
            result,
        } = loaded;
        if !self.selector.is_current(generation) {
            debug!(
                year,
                generation = generation.get(),
                latest = self.selector.current().get(),
                "discarding stale scores"
            );
            return false;
        }

        self.in_flight = None;
        match result {
            Ok(scores) => {
                info!(year, entries = scores.len(), "scores applied");
                self.scores = Arc::new(scores);
                self.scores_year = Some(year);
            }
            Err(err) => {
                warn!(year, %err, "failed to load scores, showing no data");
                self.scores = Arc::new(ScoreMap::default());
                self.scores_year = None;
            }
        }
        self.publish();
        true
    }

    /// Wait for the pending load, if any, and apply it.
    pub async fn settle(&mut self) {
        while let Some(task) = self.in_flight.take() {
            let joined = task.await;
            self.finish(joined);
        }
    }

    /// The current load task has ended: apply what it reported, or show no
    /// data when it died before reporting.
    fn finish(&mut self, joined: Result<(), JoinError>) {
        if let Err(err) = joined {
            warn!(year = self.year, %err, "score load task failed, showing no data");
            self.in_flight = None;
            self.scores = Arc::new(ScoreMap::default());
            self.scores_year = None;
            self.publish();
        }
        while let Ok(loaded) = self.loaded_rx.try_recv() {
            self.apply(loaded);
        }
    }

    /// Serve control events until `cancel` fires.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Some(task) = self.in_flight.take() {
                        task.abort();
                    }
                    info!("shutdown requested");
                    break;
                }
                Some(event) = control_rx.recv() => {
                    self.handle_control(event);
                }
                Some(loaded) = self.loaded_rx.recv() => {
                    self.apply(loaded);
                }
                joined = in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.finish(joined);
                }
            }
        }
    }

    pub fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SelectYear(year) => {
                self.select_year(year);
            }
            ControlEvent::Reload(datasets) => {
                self.range =
                    YearRange::from_features(&datasets.infrastructure, self.config.view.min_year);
                self.datasets = Arc::new(datasets);
                self.scores_year = None;
                info!(min = self.range.min, max = self.range.max, "datasets reloaded");
                self.select_year(self.year);
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(ViewState {
            year: self.year,
            generation: self.selector.current(),
            scores: Arc::clone(&self.scores),
            scores_year: self.scores_year,
            loading: self.in_flight.is_some(),
            datasets: Arc::clone(&self.datasets),
        });
    }
}

/// Completes with the load task, pending forever while nothing is in flight.
async fn in_flight(task: &mut Option<JoinHandle<()>>) -> Result<(), JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}
