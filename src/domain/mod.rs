//! Storage-agnostic types: table names, keys and value encoding.

pub mod key;
pub mod name;
pub mod value;

pub use key::MapKey;
pub use name::{sanitize, TableName};
pub use value::ValueEncoding;
