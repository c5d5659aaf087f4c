//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in metres.
    ///
    /// ```
    /// use bus_planner::domain::LatLon;
    ///
    /// let a = LatLon::new(45.1840, 0.7200);
    /// let b = LatLon::new(45.1900, 0.7300);
    /// let d = a.distance_m(&b);
    /// assert!((d - 1_029.0).abs() < 5.0);
    /// ```
    pub fn distance_m(&self, other: &LatLon) -> f64 {
        haversine_m(self.lat, self.lon, other.lat, other.lon)
    }

    /// Returns true if both components are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Haversine distance between two points, in metres.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// One point of a route shape, as read from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePoint {
    pub shape_id: String,
    pub sequence: u32,
    pub location: LatLon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let p = LatLon::new(45.18, 0.72);
        assert_eq!(p.distance_m(&p), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = LatLon::new(45.1840, 0.7200);
        let b = LatLon::new(45.1900, 0.7300);
        assert!((a.distance_m(&b) - b.distance_m(&a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_latitude() {
        let a = LatLon::new(45.0, 0.72);
        let b = LatLon::new(46.0, 0.72);
        // ~111.2 km per degree of latitude
        assert!((a.distance_m(&b) - 111_195.0).abs() < 50.0);
    }

    #[test]
    fn validity() {
        assert!(LatLon::new(45.0, 0.7).is_valid());
        assert!(!LatLon::new(91.0, 0.7).is_valid());
        assert!(!LatLon::new(f64::NAN, 0.7).is_valid());
    }
}
