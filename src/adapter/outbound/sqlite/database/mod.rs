//! SQLite database modules.
//!
//! Provides database connection management and Diesel row types for SQLite
//! persistence.

pub mod connection;
pub mod model;
