use crate::Error;
use serde::{Deserialize, Serialize};

/// A GeoJSON position. Extra coordinates (altitude) are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = Error;

    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        match coords.as_slice() {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(Error::InvalidPosition(coords.len())),
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(position: Position) -> Self {
        [position.lon, position.lat]
    }
}

impl From<Position> for geo::Coord<f64> {
    fn from(position: Position) -> Self {
        geo::coord! { x: position.lon, y: position.lat }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum LineGeometry {
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
}

impl LineGeometry {
    /// Every part as its own line.
    pub fn lines(&self) -> Vec<&[Position]> {
        match self {
            Self::LineString(line) => vec![line.as_slice()],
            Self::MultiLineString(lines) => lines.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn to_geo(&self) -> geo::MultiLineString<f64> {
        self.lines()
            .into_iter()
            .map(|line| {
                line.iter()
                    .copied()
                    .map(geo::Coord::from)
                    .collect::<geo::LineString<f64>>()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum PointGeometry {
    Point(Position),
}

impl PointGeometry {
    pub fn position(&self) -> Position {
        match self {
            Self::Point(position) => *position,
        }
    }
}
