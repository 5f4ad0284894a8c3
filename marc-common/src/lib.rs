//! # MARC Common Library
//!
//! Shared code for the multi-arrangement reconstruction tools including:
//! - Error types
//! - TOML configuration loading and discovery
//! - Item category lookup table

pub mod categories;
pub mod config;
pub mod error;

pub use categories::{CategoryTable, TrialCategory};
pub use error::{Error, Result};
