//! Application services.
//!
//! The persistent map store and its readiness signal, coordinating the
//! domain encoding rules with the storage adapters.

pub mod readiness;
pub mod store;

pub use readiness::Readiness;
pub use store::{PersistentMapStore, StoreState};
