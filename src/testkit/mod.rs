//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`memory`] - [`MemoryConnector`], an in-process
//!   [`Connector`](crate::port::Connector) with inspection and failure hooks.

pub mod memory;

pub use memory::{MemoryConnector, MemoryDriver};
