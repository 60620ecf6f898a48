//! Type definitions for content packs, entities, and installations

mod constraint_types;
mod entity_types;
mod installation_types;
mod pack_types;
mod parameter_types;
mod value_types;

pub use constraint_types::*;
pub use entity_types::*;
pub use installation_types::*;
pub use pack_types::*;
pub use parameter_types::*;
pub use value_types::*;
