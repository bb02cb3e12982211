#![forbid(unsafe_code)]

pub mod datasets;
pub mod engine;
mod error;
pub mod scores;
pub mod selection;
pub mod source;
pub mod view;

pub use datasets::Datasets;
pub use engine::{ControlEvent, ViewState, Viewer};
pub use error::Error;
pub use scores::{EmbeddedScoreLoader, FileScoreLoader, ScoreLoader, score_loader_from_config};
pub use selection::Generation;
pub use source::{DataSource, FsSource, HttpSource, source_from_config};
pub use view::export::LayerSet;
pub use view::{View, build_view};
