//! SQLite persistence adapter.
//!
//! Provides the SQLite-backed storage driver for persistent maps using
//! Diesel ORM.

pub mod database;
pub mod driver;

pub use database::connection::Durability;
pub use driver::{SqliteConnector, SqliteDriver};
