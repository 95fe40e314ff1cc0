use crate::domain::Coordinates;
use serde::{Deserialize, Serialize};

pub type LocationId = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinates>,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>, address: impl Into<String>) -> Self {
        Location {
            id,
            name: name.into(),
            address: address.into(),
            coordinates: None,
        }
    }

    #[cfg(test)]
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn id(&self) -> LocationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Cached coordinates, if resolved. A stored sentinel counts as unresolved.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(|coordinates| !coordinates.is_sentinel())
    }

    pub fn needs_resolution(&self) -> bool {
        self.coordinates().is_none()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Changing the address invalidates the cached coordinates.
    pub fn set_address(&mut self, address: impl Into<String>) {
        let address = address.into();
        if address != self.address {
            self.address = address;
            self.coordinates = None;
        }
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
    }
}
