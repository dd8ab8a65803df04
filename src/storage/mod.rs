//! Storage Layer
//!
//! Handles persistence of the JSON config file.

pub mod config;

pub use config::*;
