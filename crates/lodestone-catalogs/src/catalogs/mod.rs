//! Entity catalogs over the in-memory platform

mod grok_pattern;
mod input;
mod output;
mod pipeline_rule;
mod stream;

pub use grok_pattern::GrokPatternCatalog;
pub use input::InputCatalog;
pub use output::OutputCatalog;
pub use pipeline_rule::PipelineRuleCatalog;
pub use stream::StreamCatalog;

use anyhow::{anyhow, Error};
use lodestone_core::types::{EntityExcerpt, ModelId, ModelType, NativeEntityDescriptor};

fn excerpt(id: &str, model_type: ModelType, title: &str) -> EntityExcerpt {
    EntityExcerpt {
        id: ModelId::from(id),
        model_type,
        title: title.to_string(),
    }
}

fn not_found(native: &NativeEntityDescriptor) -> Error {
    anyhow!("{} {} does not exist", native.model_type, native.id)
}
