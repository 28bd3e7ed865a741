//! Re-exported types from external crates for convenience.
//!
//! These types are commonly used in this crate and are re-exported here
//! so users don't need to add these dependencies to their `Cargo.toml`.

/// Date and time types for converted date columns and date-range requests.
pub use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
/// JSON types that sales records are made of.
pub use serde_json::{Map, Value};
