use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::model::{EntityId, ProductVariation, VariationType};
use crate::store::traits::{SaveOutcome, SettingsStore, Store, VariationStore, VariationTypeStore};

#[derive(Debug, Default)]
struct MemoryState {
    /// Variations keyed by (entity type, id)
    variations: BTreeMap<(String, EntityId), ProductVariation>,
    next_id: EntityId,
    variation_types: BTreeMap<String, VariationType>,
    settings: BTreeMap<String, serde_json::Value>,
}

/// In-process store used when no database is configured and in tests.
///
/// All checks and writes happen under one lock, so the SKU uniqueness rule
/// holds even for concurrent saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variation_count(&self) -> usize {
        self.state.read().variations.len()
    }
}

#[async_trait::async_trait]
impl VariationStore for MemoryStore {
    async fn get_variation(&self, entity_type: &str, id: EntityId) -> Result<Option<ProductVariation>> {
        let state = self.state.read();
        Ok(state.variations.get(&(entity_type.to_string(), id)).cloned())
    }

    async fn find_by_sku(&self, entity_type: &str, sku: &str) -> Result<Vec<ProductVariation>> {
        let state = self.state.read();
        Ok(state
            .variations
            .iter()
            .filter(|((owner, _), variation)| owner == entity_type && variation.sku.as_deref() == Some(sku))
            .map(|(_, variation)| variation.clone())
            .collect())
    }

    async fn save_variation(&self, mut variation: ProductVariation) -> Result<SaveOutcome> {
        // Blank SKUs are stored as absent, matching the NULL column
        variation.sku = variation.sku.take().filter(|sku| !sku.trim().is_empty());
        let mut state = self.state.write();

        if !variation.has_empty_sku() {
            let sku = variation.sku_value();
            let taken = state.variations.iter().any(|((owner, id), existing)| {
                owner == &variation.entity_type && Some(*id) != variation.id && existing.sku.as_deref() == Some(sku)
            });
            if taken {
                return Ok(SaveOutcome::SkuConflict(sku.to_string()));
            }
        }

        let now = chrono::Utc::now();
        let id = match variation.id {
            Some(id) => {
                let key = (variation.entity_type.clone(), id);
                let existing = state
                    .variations
                    .get(&key)
                    .ok_or_else(|| anyhow!("Product variation {} does not exist", id))?;
                variation.created_at = existing.created_at;
                id
            }
            None => {
                state.next_id += 1;
                variation.created_at = Some(now);
                state.next_id
            }
        };

        variation.id = Some(id);
        variation.updated_at = Some(now);
        state
            .variations
            .insert((variation.entity_type.clone(), id), variation.clone());

        Ok(SaveOutcome::Saved(variation))
    }

    async fn delete_variation(&self, entity_type: &str, id: EntityId) -> Result<bool> {
        let mut state = self.state.write();
        Ok(state.variations.remove(&(entity_type.to_string(), id)).is_some())
    }
}

#[async_trait::async_trait]
impl VariationTypeStore for MemoryStore {
    async fn get_variation_type(&self, id: &str) -> Result<Option<VariationType>> {
        Ok(self.state.read().variation_types.get(id).cloned())
    }

    async fn list_variation_types(&self) -> Result<Vec<VariationType>> {
        Ok(self.state.read().variation_types.values().cloned().collect())
    }

    async fn upsert_variation_type(&self, variation_type: VariationType) -> Result<()> {
        self.state
            .write()
            .variation_types
            .insert(variation_type.id.clone(), variation_type);
        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn get_bundle_settings(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.state.read().settings.get(key).cloned())
    }

    async fn set_bundle_settings(&self, key: &str, settings: serde_json::Value) -> Result<()> {
        self.state.write().settings.insert(key.to_string(), settings);
        Ok(())
    }
}

impl Store for MemoryStore {}
