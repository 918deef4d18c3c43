//! Great-circle distance between coordinates.

use crate::model::Coordinates;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Distance between two points, in kilometres.
pub trait GeoDistance: Send + Sync {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64;
}

/// Haversine formula on a spherical Earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl GeoDistance for Haversine {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64 {
        let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (b.longitude - a.longitude).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        // Clamp guards asin against rounding just above 1.0 for antipodes.
        2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn same_point_is_zero() {
        let p = at(12.9716, 77.5946);
        assert_eq!(Haversine.distance_km(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = Haversine.distance_km(at(0.0, 0.0), at(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn symmetric() {
        let (a, b) = (at(51.5074, -0.1278), at(48.8566, 2.3522));
        let ab = Haversine.distance_km(a, b);
        assert!((ab - Haversine.distance_km(b, a)).abs() < 1e-9);
        assert!((ab - 343.5).abs() < 1.0, "got {ab}");
    }
}
