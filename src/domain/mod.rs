mod coordinates;
mod location;
mod ranked_location;
pub mod seed;

pub use coordinates::Coordinates;
pub use location::{Location, LocationId};
pub use ranked_location::RankedLocation;
