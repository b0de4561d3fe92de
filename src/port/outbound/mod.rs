//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the collaborators a store depends on: the map it
//! populates and the storage engine it mirrors writes into.

pub mod map;
pub mod storage;
