/// Represents all possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A data file is not valid JSON or does not have the expected shape.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A GeoJSON position carries fewer than two coordinates.
    #[error("Invalid position: expected at least 2 coordinates, got {0}")]
    InvalidPosition(usize),
}
