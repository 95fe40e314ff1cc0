use crate::domain::Location;
use serde::Serialize;

/// A location together with its distance to a queried address. Lives for one query only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedLocation {
    #[serde(flatten)]
    location: Location,
    #[serde(rename = "distanceKm")]
    distance_km: f64,
}

impl RankedLocation {
    pub fn new(location: Location, distance_km: f64) -> Self {
        RankedLocation { location, distance_km }
    }

    pub fn name(&self) -> &str {
        self.location.name()
    }

    pub fn address(&self) -> &str {
        self.location.address()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }
}
