use crate::model::{EntityId, ProductVariation, VariationType};
use anyhow::Result;

/// Result of persisting a variation.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(ProductVariation),
    /// Another entity of the same type already holds this SKU.
    SkuConflict(String),
}

#[async_trait::async_trait]
pub trait VariationStore: Send + Sync {
    async fn get_variation(&self, entity_type: &str, id: EntityId) -> Result<Option<ProductVariation>>;
    /// Load every non-deleted entity of `entity_type` whose SKU equals `sku`
    async fn find_by_sku(&self, entity_type: &str, sku: &str) -> Result<Vec<ProductVariation>>;
    /// Insert (no id) or update (id set). Enforces SKU uniqueness per entity type.
    async fn save_variation(&self, variation: ProductVariation) -> Result<SaveOutcome>;
    async fn delete_variation(&self, entity_type: &str, id: EntityId) -> Result<bool>;

    /// Whether an entity other than `exclude` already uses `sku`
    async fn sku_in_use(&self, entity_type: &str, sku: &str, exclude: Option<EntityId>) -> Result<bool> {
        let existing = self.find_by_sku(entity_type, sku).await?;
        Ok(existing
            .iter()
            .any(|variation| exclude.map_or(true, |id| variation.id != Some(id))))
    }
}

#[async_trait::async_trait]
pub trait VariationTypeStore: Send + Sync {
    async fn get_variation_type(&self, id: &str) -> Result<Option<VariationType>>;
    async fn list_variation_types(&self) -> Result<Vec<VariationType>>;
    async fn upsert_variation_type(&self, variation_type: VariationType) -> Result<()>;
}

/// Bundle-scoped settings, keyed by `<bundle-entity-type>_<bundle-id>`.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_bundle_settings(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set_bundle_settings(&self, key: &str, settings: serde_json::Value) -> Result<()>;
}

pub trait Store: VariationStore + VariationTypeStore + SettingsStore + Send + Sync {}
