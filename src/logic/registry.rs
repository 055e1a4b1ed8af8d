use itertools::Itertools;
use serde_json::{Map, Value};

use crate::error::{AutoSkuError, AutoSkuResult};
use crate::logic::generator::{GeneratorDefinition, SkuGenerator, TokenGenerator, TOKEN_GENERATOR};

pub type GeneratorConstructor = fn(Map<String, Value>) -> Box<dyn SkuGenerator>;

#[derive(Debug, Clone, Copy)]
struct Registration {
    definition: GeneratorDefinition,
    constructor: GeneratorConstructor,
}

/// Generators shipped with the crate.
const BUILTIN_GENERATORS: [Registration; 1] = [Registration {
    definition: TOKEN_GENERATOR,
    constructor: TokenGenerator::create,
}];

/// Maps generator plugin ids to their constructors.
#[derive(Debug, Clone)]
pub struct GeneratorRegistry {
    registrations: Vec<Registration>,
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self {
            registrations: BUILTIN_GENERATORS.to_vec(),
        }
    }

    /// Adds (or replaces) a generator.
    pub fn register(&mut self, definition: GeneratorDefinition, constructor: GeneratorConstructor) {
        self.registrations.retain(|r| r.definition.id != definition.id);
        self.registrations.push(Registration {
            definition,
            constructor,
        });
    }

    /// Registered generators ordered by label.
    pub fn definitions(&self) -> Vec<GeneratorDefinition> {
        self.registrations
            .iter()
            .map(|r| r.definition)
            .sorted_by(|a, b| a.label.cmp(b.label))
            .collect()
    }

    pub fn get_definition(&self, plugin_id: &str) -> Option<GeneratorDefinition> {
        self.registrations
            .iter()
            .find(|r| r.definition.id == plugin_id)
            .map(|r| r.definition)
    }

    pub fn has_definition(&self, plugin_id: &str) -> bool {
        self.get_definition(plugin_id).is_some()
    }

    /// Builds a generator with `configuration` merged over its defaults.
    pub fn create_instance(
        &self,
        plugin_id: &str,
        configuration: Map<String, Value>,
    ) -> AutoSkuResult<Box<dyn SkuGenerator>> {
        let registration = self
            .registrations
            .iter()
            .find(|r| r.definition.id == plugin_id)
            .ok_or_else(|| AutoSkuError::UnknownGenerator(plugin_id.to_string()))?;

        log::debug!("Creating SKU generator '{}'", plugin_id);
        Ok((registration.constructor)(configuration))
    }
}
