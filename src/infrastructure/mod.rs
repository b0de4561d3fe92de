//! Infrastructure layer.
//!
//! Provides technical concerns that support the store without containing
//! persistence logic: configuration loading and logging setup.
//!
//! # Submodules
//!
//! - [`config`] - Store options, settings files and logging
pub mod config;
