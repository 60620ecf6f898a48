//! Common test utilities for lodestone-engine
//!
//! This module provides shared test infrastructure including:
//! - Content pack and entity builders
//! - Recording catalogs that journal every platform call
//! - Static constraint checkers and failing stores

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
