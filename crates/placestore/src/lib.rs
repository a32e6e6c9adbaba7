//! `placestore` - A local, durable store of saved places
//!
//! This library keeps named places (a category, a coordinate, free-text notes
//! and a favorite flag) in a `SQLite` database, lists them in a stable order,
//! and notifies subscribers whenever the stored set changes.
//!
//! ```no_run
//! use placestore::{Coordinate, PlaceDraft, PlaceStore, StoreOptions};
//!
//! # fn main() -> placestore::Result<()> {
//! let store = PlaceStore::open("places.db", &StoreOptions::default())?;
//! let mut events = store.subscribe();
//!
//! let market = store.create(
//!     &PlaceDraft::new("Pike Place Market")
//!         .with_category("Market")
//!         .with_coordinate(Coordinate::new(47.609, -122.342)),
//! )?;
//! store.toggle_favorite(market.id)?;
//!
//! assert_eq!(events.drain().len(), 2);
//! store.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod map;
pub mod place;
pub mod query;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{PlaceEvent, PlaceEvents};
pub use logging::init_logging;
pub use place::{Coordinate, Place, PlaceDraft, PlaceId, PlacePatch};
pub use query::{ListQuery, SortKey, SortOrder};
pub use store::{PlaceStats, PlaceStore, StoreOptions};
