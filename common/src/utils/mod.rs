//! Utility functions and helpers.

pub mod connection_uri;
pub mod sql_ident;
pub mod type_descriptor;

// Re-export commonly used types
pub use connection_uri::{database_name_from_uri, percent_decode, percent_encode, redact_password};
pub use sql_ident::{is_usable_table_name, quote_identifier};
pub use type_descriptor::TypeDescriptor;
