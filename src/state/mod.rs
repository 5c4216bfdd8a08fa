pub mod cache;
pub mod factory;
pub mod locks;
pub mod sled_store;
pub mod store;

pub use cache::*;
pub use locks::{UserGuard, UserLocks};
pub use factory::{create_in_memory_store, create_tour_store, seed_tour_store, TourSeed};
pub use sled_store::SledTourStore;
pub use store::{InMemoryTourStore, TourStore};
