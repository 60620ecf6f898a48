//! Configuration management for Lodestone

mod loader;

pub use loader::*;
