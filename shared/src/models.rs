use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in degrees, serialized as `[latitude, longitude]`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Great-circle distance to another point, in kilometers.
    pub fn distance_km(&self, other: &LatLon) -> f64 {
        haversine(self, other, EARTH_RADIUS_KM)
    }
}

/// Distance between two coordinates on a sphere of the given radius.
/// https://en.wikipedia.org/wiki/Haversine_formula
pub fn haversine(a: &LatLon, b: &LatLon, radius: f64) -> f64 {
    let lat1 = a.0.to_radians();
    let lat2 = b.0.to_radians();
    let diff_lat = (b.0 - a.0).to_radians();
    let diff_lon = (b.1 - a.1).to_radians();

    let hav = (diff_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (diff_lon / 2.0).sin().powi(2);

    2.0 * radius * hav.sqrt().atan2((1.0 - hav).sqrt())
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    /// ICAO airport code, unique across the dataset.
    pub id: String,
    pub city: String,
    pub name: String,
    pub coordinates: LatLon,
    pub currency: String,
    pub time_zone: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = LatLon(48.7870, -1.9991);
        assert_eq!(p.distance_km(&p), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = LatLon(51.4700, -0.4543); // London Heathrow
        let b = LatLon(49.0097, 2.5479); // Paris Charles de Gaulle
        assert_eq!(a.distance_km(&b), b.distance_km(&a));
    }

    #[test]
    fn test_haversine_known_distance() {
        // Heathrow to Charles de Gaulle is roughly 347 km great-circle
        let a = LatLon(51.4700, -0.4543);
        let b = LatLon(49.0097, 2.5479);
        let d = a.distance_km(&b);
        assert!(d > 340.0 && d < 355.0, "unexpected distance: {}", d);
    }

    #[test]
    fn test_haversine_scales_with_radius() {
        let a = LatLon(0.0, 0.0);
        let b = LatLon(0.0, 90.0);
        // A quarter of the equator on a unit sphere
        let d = haversine(&a, &b, 1.0);
        assert!((d - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_coordinates_serialize_as_pair() {
        let airport = Airport {
            id: "EGLL".to_string(),
            city: "London".to_string(),
            name: "Heathrow".to_string(),
            coordinates: LatLon(51.47, -0.4543),
            currency: "GBP".to_string(),
            time_zone: "Europe/London".to_string(),
        };

        let json = serde_json::to_value(&airport).unwrap();
        assert_eq!(json["coordinates"], serde_json::json!([51.47, -0.4543]));
        assert_eq!(json["timeZone"], "Europe/London");
    }
}
