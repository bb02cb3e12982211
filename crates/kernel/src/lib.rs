pub mod activity;
pub mod bounds;
pub mod color;
mod error;
pub mod filter;
pub mod model;
pub mod scores;
pub mod stats;
pub mod tension;
pub mod utils;

pub use error::Error;
pub use scores::{ScoreEntry, ScoreMap};
