//! Data Models
//!
//! Application-level data structures. Domain types live in `aspirepath-core`.

pub mod settings;

pub use settings::*;
