use crate::domain::{Coordinates, Location, LocationId};
use crate::store::StoreError;

/// Coordinates resolved for a location at the address it had when the lookup started.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinatesUpdate {
    pub id: LocationId,
    pub address: String,
    pub coordinates: Coordinates,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocationCollection {
    locations: Vec<Location>,
    /// `None` once the id space is used up.
    next_id: Option<LocationId>,
}

impl LocationCollection {
    pub fn new(locations: Vec<Location>) -> Self {
        let next_id = locations.iter().map(Location::id).max().map_or(Some(1), |id| id.checked_add(1));
        LocationCollection { locations, next_id }
    }

    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|location| location.id() == id)
    }

    /// Replaces the location with the same id in place, or appends it.
    pub fn upsert(&mut self, location: Location) -> &Location {
        self.next_id = self.next_id.zip(location.id().checked_add(1)).map(|(next, after)| next.max(after));
        match self.locations.iter().position(|existing| existing.id() == location.id()) {
            Some(index) => {
                self.locations[index] = location;
                &self.locations[index]
            }
            None => {
                self.locations.push(location);
                &self.locations[self.locations.len() - 1]
            }
        }
    }

    pub fn add(&mut self, name: &str, address: &str) -> Result<&Location, StoreError> {
        let (name, address) = validate(name, address)?;
        let id = self.next_id.ok_or(StoreError::IdsExhausted)?;
        Ok(self.upsert(Location::new(id, name, address)))
    }

    /// Updates name and address. A changed address drops the cached coordinates.
    pub fn edit(&mut self, id: LocationId, name: &str, address: &str) -> Result<&Location, StoreError> {
        let (name, address) = validate(name, address)?;
        let mut location = self.get(id).cloned().ok_or(StoreError::UnknownLocation(id))?;
        location.set_name(name);
        location.set_address(address);
        Ok(self.upsert(location))
    }

    pub fn delete(&mut self, id: LocationId) -> Result<Location, StoreError> {
        let index = self
            .locations
            .iter()
            .position(|location| location.id() == id)
            .ok_or(StoreError::UnknownLocation(id))?;
        Ok(self.locations.remove(index))
    }

    /// Caches resolved coordinates and returns how many were applied.
    ///
    /// Updates for locations that were deleted or re-addressed since the lookup started are dropped.
    pub fn resolve_coordinates(&mut self, updates: &[CoordinatesUpdate]) -> usize {
        let mut applied = 0;
        for update in updates.iter().filter(|update| !update.coordinates.is_sentinel()) {
            let Some(location) = self.locations.iter_mut().find(|location| location.id() == update.id) else {
                continue;
            };
            if location.address() != update.address {
                continue;
            }
            location.set_coordinates(update.coordinates);
            applied += 1;
        }
        applied
    }
}

fn validate<'a>(name: &'a str, address: &'a str) -> Result<(&'a str, &'a str), StoreError> {
    let name = name.trim();
    let address = address.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    if address.is_empty() {
        return Err(StoreError::EmptyAddress);
    }
    Ok((name, address))
}
