//! # lodestone-core
//!
//! Core library for Lodestone providing:
//! - The content pack value model (packs, entities, parameters, constraints)
//! - Installation records
//! - The shared error type
//! - Configuration file loading (lodestone.yaml)

pub mod config;
pub mod error;
pub mod types;

pub use config::LodestoneConfig;
pub use error::{Error, Result};
