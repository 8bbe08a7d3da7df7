// Entity Models
//
// - AxieClass: the closed set of nine class tags, one store each
// - ListingRecord: a marketplace listing as it arrives
// - PersistedCreature: the normalized row kept per class

pub mod class;
pub mod creature;

pub use class::AxieClass;
pub use creature::{HighestOffer, ListingRecord, PersistedCreature};
