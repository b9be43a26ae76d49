pub mod collection;
pub mod lookup;

pub use collection::{AddOutcome, CollectionService, MovieChanges, RemoveOutcome};
pub use lookup::{MovieLookup, OmdbLookup};
