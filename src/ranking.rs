use crate::distance::distance;
use crate::domain::{Coordinates, Location, LocationId, RankedLocation};
use crate::geocoding::{Geocoder, GeocodingError};
use crate::location_collection::CoordinatesUpdate;
use crate::store::StoreHandle;
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Finds the `limit` locations nearest to `address`, closest first.
///
/// The user address is resolved first. Only then are locations without cached coordinates geocoded in one
/// batch, with the results cached in the store. Locations that still cannot be resolved are left out.
#[instrument(skip(geocoder, store))]
pub async fn find_nearest(
    address: &str,
    geocoder: &dyn Geocoder,
    store: &StoreHandle,
    limit: usize,
) -> Result<Vec<RankedLocation>, RankingError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(RankingError::EmptyAddress);
    }

    info!("📍 Ranking locations...");
    let origin = geocoder
        .resolve(address)
        .await?
        .ok_or_else(|| RankingError::AddressNotFound(address.to_string()))?;

    let snapshot = store.snapshot();
    let (resolved, pending): (Vec<&Location>, Vec<&Location>) = snapshot.iter().partition(|location| !location.needs_resolution());
    debug!("📍 {} location(s) cached, {} to resolve", resolved.len(), pending.len());

    let pending_addresses = pending.iter().map(|location| location.address().to_string()).collect::<Vec<_>>();
    let lookups = geocoder.resolve_many(&pending_addresses).await?;

    let updates = pending
        .iter()
        .filter_map(|location| {
            let coordinates = lookups.get(location.address()).copied().flatten()?;
            Some(CoordinatesUpdate {
                id: location.id(),
                address: location.address().to_string(),
                coordinates,
            })
        })
        .collect::<Vec<_>>();
    let fresh = updates.iter().map(|update| (update.id, update.coordinates)).collect::<HashMap<_, _>>();

    if !updates.is_empty() {
        if let Err(e) = store.resolve_coordinates(updates).await {
            warn!("⚠️ Could not cache resolved coordinates: {}", e);
        }
    }

    let ranked = rank(origin, snapshot.iter(), &fresh, limit);
    info!("📍 Ranking locations... OK, {} of {} returned", ranked.len(), snapshot.len());

    Ok(ranked)
}

/// Sorts resolvable locations by distance to `origin`. Ties keep the collection order.
fn rank<'a>(
    origin: Coordinates,
    locations: impl Iterator<Item = &'a Location>,
    fresh: &HashMap<LocationId, Coordinates>,
    limit: usize,
) -> Vec<RankedLocation> {
    let mut ranked = locations
        .filter_map(|location| {
            let Some(coordinates) = location.coordinates().or_else(|| fresh.get(&location.id()).copied()) else {
                debug!(location_id = location.id(), "📍 Skipping unresolved location '{}'", location.name());
                return None;
            };
            let mut location = location.clone();
            location.set_coordinates(coordinates);
            Some(RankedLocation::new(location, distance(origin, coordinates)))
        })
        .collect::<Vec<_>>();

    ranked.sort_by_key(|location| OrderedFloat(location.distance_km()));
    ranked.truncate(limit);
    ranked
}

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("Please enter a valid address.")]
    EmptyAddress,
    #[error("Could not find coordinates for \"{0}\". Please try a more specific address.")]
    AddressNotFound(String),
    #[error("Failed to get coordinates for the address: {0}")]
    Geocoding(#[from] GeocodingError),
}
