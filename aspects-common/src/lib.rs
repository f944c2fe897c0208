//! # Aspects Common Library
//!
//! Shared code for the aspects crates:
//! - Error type used across the workspace
//! - Configuration file resolution and TOML loading

pub mod config;
pub mod error;

pub use error::{Error, Result};
