//! Configuration: store options, settings files and logging.

pub mod logging;
pub mod options;
pub mod settings;

pub use logging::LoggingConfig;
pub use options::{StoreOptions, DATABASE_FILE, DEFAULT_DATA_DIR};
pub use settings::Settings;
