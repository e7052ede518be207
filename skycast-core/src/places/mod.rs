//! City-name index over the offline dataset.

pub mod cell;
pub mod fuzzy;
pub mod index;

pub use cell::{IndexState, PlaceIndexCell};
pub use fuzzy::{MAX_DISTANCE, Named, best_match};
pub use index::{MatchKind, PlaceIndex, PlaceIndexBuilder};
