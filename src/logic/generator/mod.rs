pub mod token;

pub use token::*;

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::error::AutoSkuResult;
use crate::logic::context::SiteInfo;
use crate::logic::unique::clean_candidate;
use crate::model::{FormErrors, FormField, ProductVariation, UserContext};

/// Registration metadata of a generator plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratorDefinition {
    pub id: &'static str,
    pub label: &'static str,
}

/// What a generator sees of the entity being saved.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub entity: &'a ProductVariation,
    pub bundle_label: &'a str,
    pub site: &'a SiteInfo,
    pub user: Option<&'a UserContext>,
}

/// A strategy producing a raw SKU candidate. Generators are pure: the
/// caller makes the result unique and writes it to the entity.
pub trait SkuGenerator: Send + Sync + Debug {
    fn definition(&self) -> GeneratorDefinition;

    fn default_configuration(&self) -> Map<String, Value> {
        Map::new()
    }

    fn configuration(&self) -> &Map<String, Value>;

    /// Replaces the configuration with `configuration` merged over the defaults.
    fn set_configuration(&mut self, configuration: Map<String, Value>);

    fn configuration_form(&self) -> Vec<FormField> {
        Vec::new()
    }

    fn validate_configuration(&self, _configuration: &Map<String, Value>) -> FormErrors {
        FormErrors::new()
    }

    /// Strategy specific output; may be empty.
    fn raw_sku(&self, input: &GenerationInput<'_>) -> AutoSkuResult<String>;

    /// Raw output, or the alternative SKU when nothing survives cleaning.
    fn generate(&self, input: &GenerationInput<'_>) -> AutoSkuResult<String> {
        let sku = self.raw_sku(input)?;
        if clean_candidate(&sku).trim().is_empty() {
            return Ok(alternative_sku(input));
        }
        Ok(sku)
    }
}

/// Fallback SKU: `"<bundle label> <id>"`, or just the label for unsaved entities.
pub fn alternative_sku(input: &GenerationInput<'_>) -> String {
    match input.entity.id {
        Some(id) => format!("{} {}", input.bundle_label, id),
        None => input.bundle_label.to_string(),
    }
}

/// Recursively merges `overrides` into `defaults`. Nested objects are merged
/// key by key, every other value in `overrides` wins.
pub fn merge_deep(mut defaults: Map<String, Value>, overrides: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overrides {
        match (defaults.remove(&key), value) {
            (Some(Value::Object(base)), Value::Object(nested)) => {
                defaults.insert(key, Value::Object(merge_deep(base, nested)));
            }
            (_, value) => {
                defaults.insert(key, value);
            }
        }
    }
    defaults
}
