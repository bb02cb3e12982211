//! Axis-aligned cells around a centroid, using the flat-Earth approximation.
//!
//! Valid for city-scale sizes away from the poles. Out-of-range latitudes
//! give degenerate but finite-or-infinite bounds, never a panic.

use config::CellShape;
use serde::{Deserialize, Serialize};

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_111.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn lat_span(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn lng_span(&self) -> f64 {
        self.north_east.lng - self.south_west.lng
    }

    /// Closed exterior ring in GeoJSON `[lng, lat]` order, counter-clockwise.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        let Self {
            south_west: sw,
            north_east: ne,
        } = *self;
        vec![
            [sw.lng, sw.lat],
            [ne.lng, sw.lat],
            [ne.lng, ne.lat],
            [sw.lng, ne.lat],
            [sw.lng, sw.lat],
        ]
    }
}

/// Square of `side_meters` centered on `center`.
///
/// ```
/// # use kernel::bounds::{square_bounds, LatLng};
/// let b = square_bounds(LatLng::new(0.0, 0.0), 222_222.0);
/// assert!((b.lat_span() - 2.0).abs() < 1e-9);
/// assert!((b.lng_span() - 2.0).abs() < 1e-9);
/// ```
pub fn square_bounds(center: LatLng, side_meters: f64) -> Bounds {
    let half = side_meters / 2.0;
    let d_lat = half / METERS_PER_DEGREE;
    let d_lng = half / (METERS_PER_DEGREE * center.lat.to_radians().cos());
    Bounds {
        south_west: LatLng::new(center.lat - d_lat, center.lng - d_lng),
        north_east: LatLng::new(center.lat + d_lat, center.lng + d_lng),
    }
}

/// Cell of fixed angular size centered on `center`.
pub fn grid_cell_bounds(center: LatLng, lat_step: f64, lon_step: f64) -> Bounds {
    Bounds {
        south_west: LatLng::new(center.lat - lat_step / 2.0, center.lng - lon_step / 2.0),
        north_east: LatLng::new(center.lat + lat_step / 2.0, center.lng + lon_step / 2.0),
    }
}

pub fn cell_bounds(center: LatLng, shape: CellShape) -> Bounds {
    match shape {
        CellShape::Square { side_meters } => square_bounds(center, side_meters),
        CellShape::Grid { lat_step, lon_step } => grid_cell_bounds(center, lat_step, lon_step),
    }
}
