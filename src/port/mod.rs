//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems: the in-memory map that receives loaded entries, and the SQL
//! engine that holds the rows.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │   PersistentMapStore    │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌─────────┐                                          ┌───────────┐
//! │MapSink  │                                          │ Connector │
//! │(HashMap)│                                          │ (SQLite)  │
//! └─────────┘                                          └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`MapSink`] - Receives entries loaded during `init`
//! - [`Connector`], [`TableDriver`] - Row storage for one table

pub mod outbound;

pub use outbound::map::MapSink;
pub use outbound::storage::{Connector, StoredRow, TableDriver};
