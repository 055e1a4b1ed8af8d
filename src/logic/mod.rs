pub mod context;
pub mod expression;
pub mod generator;
pub mod manager;
pub mod presave;
pub mod registry;
pub mod routing;
pub mod settings_form;
pub mod token;
pub mod unique;

pub use context::*;
pub use generator::{alternative_sku, GenerationInput, GeneratorDefinition, SkuGenerator, TokenGenerator};
pub use manager::*;
pub use presave::*;
pub use registry::*;
pub use routing::*;
pub use settings_form::*;
pub use token::*;
pub use unique::*;
