use anyhow::Context;

use crate::error::{AutoSkuError, AutoSkuResult};
use crate::logic::context::AutoSkuContext;
use crate::logic::generator::GenerationInput;
use crate::logic::unique::UniquenessResolver;
use crate::model::{
    settings_key, AutoSkuMode, AutoSkuSettings, EntityTypeDefinition, FormOption, ProductVariation,
    UserContext, TOKEN_GENERATOR_ID,
};
use crate::store::traits::{SettingsStore, Store, VariationTypeStore};

/// Field that holds the SKU when the entity type does not name one through its keys.
const SKU_FIELD: &str = "sku";

/// Reads the auto SKU settings stored under `key`. Missing settings mean
/// auto SKU is disabled.
pub async fn load_settings<S: SettingsStore + ?Sized>(store: &S, key: &str) -> AutoSkuResult<AutoSkuSettings> {
    match store.get_bundle_settings(key).await? {
        Some(value) => Ok(AutoSkuSettings::from_stored(value)
            .with_context(|| format!("Malformed auto SKU settings under '{}'", key))?),
        None => Ok(AutoSkuSettings::default()),
    }
}

/// The three modes with their administrator-facing labels.
pub fn mode_options() -> Vec<FormOption> {
    AutoSkuMode::ALL
        .iter()
        .map(|mode| FormOption {
            value: mode.as_str().to_string(),
            label: mode.label().to_string(),
        })
        .collect()
}

/// Auto SKU behaviour bound to one entity type and bundle.
///
/// A manager lives for one save cycle: once `set_sku` has written a value,
/// `auto_sku_needed` reports false until `reset` is called.
pub struct AutoSkuManager<'a, S: Store> {
    context: &'a AutoSkuContext<S>,
    definition: &'a EntityTypeDefinition,
    bundle: String,
    bundle_label: String,
    settings: AutoSkuSettings,
    applied: bool,
}

impl<'a, S: Store> AutoSkuManager<'a, S> {
    /// Resolves the entity type, the bundle and the bundle's settings.
    pub async fn load(context: &'a AutoSkuContext<S>, entity_type_id: &str, bundle: &str) -> AutoSkuResult<Self> {
        let definition = context
            .entity_types
            .get_definition(entity_type_id)
            .ok_or_else(|| AutoSkuError::EntityTypeNotFound(entity_type_id.to_string()))?;

        let bundle_label = if bundle == definition.id || definition.bundle_entity_type.is_none() {
            definition.label.clone()
        } else {
            context
                .store
                .get_variation_type(bundle)
                .await?
                .ok_or_else(|| AutoSkuError::BundleNotFound(bundle.to_string()))?
                .label
        };

        let owner = definition.bundle_entity_type.as_deref().unwrap_or(&definition.id);
        let settings = load_settings(context.store.as_ref(), &settings_key(owner, bundle)).await?;

        Ok(Self {
            context,
            definition,
            bundle: bundle.to_string(),
            bundle_label,
            settings,
            applied: false,
        })
    }

    pub fn settings(&self) -> &AutoSkuSettings {
        &self.settings
    }

    pub fn bundle_label(&self) -> &str {
        &self.bundle_label
    }

    pub fn has_sku(&self) -> bool {
        self.definition.has_key(SKU_FIELD) || self.definition.field_definitions(&self.bundle).contains_key(SKU_FIELD)
    }

    /// Storage name of the SKU field, empty when the entity type has none.
    pub fn sku_field_name(&self) -> &str {
        if let Some(field) = self.definition.key(SKU_FIELD) {
            return field;
        }
        if self.definition.field_definitions(&self.bundle).contains_key(SKU_FIELD) {
            return SKU_FIELD;
        }
        ""
    }

    pub fn has_auto_sku(&self) -> bool {
        self.settings.mode == AutoSkuMode::Enabled
    }

    pub fn has_optional_auto_sku(&self) -> bool {
        self.settings.mode == AutoSkuMode::Optional
    }

    pub fn auto_sku_needed(&self, entity: &ProductVariation) -> bool {
        !self.applied && (self.has_auto_sku() || (self.has_optional_auto_sku() && entity.has_empty_sku()))
    }

    /// True once a generated value has been written this cycle.
    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Forget the applied flag so the next `set_sku` generates again.
    pub fn reset(&mut self) {
        self.applied = false;
    }

    /// Generates a unique SKU and writes it into the entity's SKU field.
    pub async fn set_sku(&mut self, entity: &mut ProductVariation, user: Option<&UserContext>) -> AutoSkuResult<String> {
        if self.applied {
            return Ok(entity.sku_value().to_string());
        }
        if !self.has_sku() {
            return Err(AutoSkuError::MissingSkuField {
                entity_type: self.definition.id.clone(),
            });
        }

        let plugin_id = self.settings.plugin.as_deref().unwrap_or(TOKEN_GENERATOR_ID);
        let generator = self
            .context
            .generators
            .create_instance(plugin_id, self.settings.configuration.clone())?;

        let raw = generator.generate(&GenerationInput {
            entity: &*entity,
            bundle_label: &self.bundle_label,
            site: &self.context.site,
            user,
        })?;

        let sku = UniquenessResolver::new(self.context.store.as_ref())
            .make_unique(entity, &raw)
            .await?;

        let field = self.sku_field_name().to_string();
        entity.set_field(&field, sku.clone());
        self.applied = true;

        log::debug!(
            "Generated SKU '{}' for {} of bundle '{}' with '{}'",
            sku,
            self.definition.id,
            self.bundle,
            plugin_id
        );
        Ok(sku)
    }
}
