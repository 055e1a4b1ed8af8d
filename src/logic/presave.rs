use crate::error::{AutoSkuError, AutoSkuResult};
use crate::logic::context::AutoSkuContext;
use crate::logic::manager::AutoSkuManager;
use crate::model::{AutoSkuMode, ProductVariation, UserContext};
use crate::store::traits::{SaveOutcome, Store, VariationStore};

/// Hooks automatic SKU generation into variation saves.
pub struct AutoSkuService<'a, S: Store> {
    context: &'a AutoSkuContext<S>,
}

impl<'a, S: Store> AutoSkuService<'a, S> {
    pub fn new(context: &'a AutoSkuContext<S>) -> Self {
        Self { context }
    }

    /// Binds a manager to the entity's type, bundle and bundle settings.
    pub async fn decorate(&self, entity: &ProductVariation) -> AutoSkuResult<AutoSkuManager<'a, S>> {
        AutoSkuManager::load(self.context, &entity.entity_type, &entity.bundle).await
    }

    /// Fills the SKU when the bundle asks for it, then persists the entity.
    ///
    /// When the store reports that another entity took the generated SKU in the
    /// meantime, a new value is generated and the save retried. Conflicts on a
    /// SKU the user entered are reported as `DuplicateSku`.
    pub async fn save_variation(
        &self,
        mut entity: ProductVariation,
        user: Option<&UserContext>,
    ) -> AutoSkuResult<ProductVariation> {
        let mut manager = self.decorate(&entity).await?;

        if manager.settings().mode == AutoSkuMode::Disabled && entity.has_empty_sku() {
            return Err(AutoSkuError::SkuRequired);
        }

        if manager.auto_sku_needed(&entity) {
            manager.set_sku(&mut entity, user).await?;
        }

        let action = if entity.is_new() { "Created" } else { "Updated" };
        let mut retries = 0;
        loop {
            match self.context.store.save_variation(entity.clone()).await? {
                SaveOutcome::Saved(saved) => {
                    log::info!(
                        "{} {} {} with SKU '{}'",
                        action,
                        saved.entity_type,
                        saved.id.unwrap_or_default(),
                        saved.sku_value()
                    );
                    return Ok(saved);
                }
                SaveOutcome::SkuConflict(sku) => {
                    if !manager.applied() || retries >= self.context.max_conflict_retries {
                        return Err(AutoSkuError::DuplicateSku(sku));
                    }
                    retries += 1;
                    log::warn!(
                        "Generated SKU '{}' was taken concurrently, regenerating (attempt {})",
                        sku,
                        retries
                    );
                    manager.reset();
                    manager.set_sku(&mut entity, user).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AutoSkuSettings, EntityId, EntityTypeManager, VariationType};
    use crate::seed::default_entity_types;
    use crate::store::memory::MemoryStore;
    use crate::store::traits::{SettingsStore, VariationTypeStore};
    use anyhow::Result;
    use parking_lot::Mutex;
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    async fn context_with(mode: AutoSkuMode, pattern: &str) -> AutoSkuContext<MemoryStore> {
        let store = MemoryStore::new();
        store
            .upsert_variation_type(VariationType::new("default", "Default"))
            .await
            .unwrap();
        let mut configuration = Map::new();
        configuration.insert("pattern".to_string(), json!(pattern));
        store
            .set_bundle_settings(
                "commerce_product_variation_type_default",
                AutoSkuSettings::new(mode, "token", configuration).to_stored(),
            )
            .await
            .unwrap();
        AutoSkuContext::new(Arc::new(store), EntityTypeManager::new(default_entity_types()))
    }

    #[tokio::test]
    async fn test_disabled_mode_requires_sku() {
        let context = context_with(AutoSkuMode::Disabled, "").await;
        let service = AutoSkuService::new(&context);

        let result = service.save_variation(ProductVariation::new("default", "Shirt"), None).await;
        assert!(matches!(result, Err(AutoSkuError::SkuRequired)));

        let saved = service
            .save_variation(ProductVariation::new("default", "Shirt").with_sku("MANUAL-1"), None)
            .await
            .unwrap();
        assert_eq!(saved.sku_value(), "MANUAL-1");
    }

    #[tokio::test]
    async fn test_enabled_mode_always_yields_sku() {
        let context = context_with(AutoSkuMode::Enabled, "").await;
        let service = AutoSkuService::new(&context);

        let first = service
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await
            .unwrap();
        let second = service
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await
            .unwrap();

        assert_eq!(first.sku_value(), "Default");
        assert_eq!(second.sku_value(), "Default_0");
    }

    #[tokio::test]
    async fn test_markup_only_output_falls_back() {
        let context = context_with(
            AutoSkuMode::Enabled,
            "<b>[commerce_product_variation:product:title]</b>",
        )
        .await;
        let service = AutoSkuService::new(&context);

        let saved = service
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await
            .unwrap();
        assert_eq!(saved.sku_value(), "Default");

        let with_product = service
            .save_variation(
                ProductVariation::new("default", "Shirt").with_product(3, "Blue Shirt"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(with_product.sku_value(), "Blue Shirt");
    }

    #[tokio::test]
    async fn test_enabled_mode_overrides_entered_sku() {
        let context = context_with(AutoSkuMode::Enabled, "[commerce_product_variation:title]").await;
        let service = AutoSkuService::new(&context);

        let saved = service
            .save_variation(ProductVariation::new("default", "Shirt").with_sku("MANUAL"), None)
            .await
            .unwrap();
        assert_eq!(saved.sku_value(), "Shirt");
    }

    #[tokio::test]
    async fn test_update_keeps_own_sku() {
        let context = context_with(AutoSkuMode::Enabled, "[commerce_product_variation:title]").await;
        let service = AutoSkuService::new(&context);

        let saved = service
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await
            .unwrap();
        let resaved = service.save_variation(saved, None).await.unwrap();
        assert_eq!(resaved.sku_value(), "Shirt");
    }

    #[tokio::test]
    async fn test_optional_mode_never_overwrites() {
        let context = context_with(AutoSkuMode::Optional, "[commerce_product_variation:title]").await;
        let service = AutoSkuService::new(&context);

        let manual = service
            .save_variation(ProductVariation::new("default", "Shirt").with_sku("MANUAL"), None)
            .await
            .unwrap();
        let generated = service
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await
            .unwrap();

        assert_eq!(manual.sku_value(), "MANUAL");
        assert_eq!(generated.sku_value(), "Shirt");
    }

    #[tokio::test]
    async fn test_manual_duplicate_is_rejected() {
        let context = context_with(AutoSkuMode::Optional, "").await;
        let service = AutoSkuService::new(&context);

        service
            .save_variation(ProductVariation::new("default", "A").with_sku("SAME"), None)
            .await
            .unwrap();
        let result = service
            .save_variation(ProductVariation::new("default", "B").with_sku("SAME"), None)
            .await;

        assert!(matches!(result, Err(AutoSkuError::DuplicateSku(sku)) if sku == "SAME"));
    }

    #[tokio::test]
    async fn test_unknown_bundle() {
        let context = context_with(AutoSkuMode::Enabled, "").await;
        let service = AutoSkuService::new(&context);

        let result = service
            .save_variation(ProductVariation::new("missing", "Shirt"), None)
            .await;
        assert!(matches!(result, Err(AutoSkuError::BundleNotFound(_))));
    }

    /// Wraps the memory store and reports a conflict on the first `races` saves,
    /// as if a concurrent request had claimed the SKU between check and insert.
    struct RacyStore {
        inner: MemoryStore,
        races: Mutex<u32>,
    }

    #[async_trait::async_trait]
    impl VariationStore for RacyStore {
        async fn get_variation(&self, entity_type: &str, id: EntityId) -> Result<Option<ProductVariation>> {
            self.inner.get_variation(entity_type, id).await
        }

        async fn find_by_sku(&self, entity_type: &str, sku: &str) -> Result<Vec<ProductVariation>> {
            self.inner.find_by_sku(entity_type, sku).await
        }

        async fn save_variation(&self, variation: ProductVariation) -> Result<SaveOutcome> {
            {
                let mut races = self.races.lock();
                if *races > 0 {
                    *races -= 1;
                    return Ok(SaveOutcome::SkuConflict(variation.sku_value().to_string()));
                }
            }
            self.inner.save_variation(variation).await
        }

        async fn delete_variation(&self, entity_type: &str, id: EntityId) -> Result<bool> {
            self.inner.delete_variation(entity_type, id).await
        }
    }

    #[async_trait::async_trait]
    impl VariationTypeStore for RacyStore {
        async fn get_variation_type(&self, id: &str) -> Result<Option<VariationType>> {
            self.inner.get_variation_type(id).await
        }

        async fn list_variation_types(&self) -> Result<Vec<VariationType>> {
            self.inner.list_variation_types().await
        }

        async fn upsert_variation_type(&self, variation_type: VariationType) -> Result<()> {
            self.inner.upsert_variation_type(variation_type).await
        }
    }

    #[async_trait::async_trait]
    impl SettingsStore for RacyStore {
        async fn get_bundle_settings(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get_bundle_settings(key).await
        }

        async fn set_bundle_settings(&self, key: &str, settings: Value) -> Result<()> {
            self.inner.set_bundle_settings(key, settings).await
        }
    }

    impl Store for RacyStore {}

    async fn racy_context(races: u32, retries: u32) -> AutoSkuContext<RacyStore> {
        let inner = MemoryStore::new();
        inner
            .upsert_variation_type(VariationType::new("default", "Default"))
            .await
            .unwrap();
        let mut configuration = Map::new();
        configuration.insert("pattern".to_string(), json!("[commerce_product_variation:title]"));
        inner
            .set_bundle_settings(
                "commerce_product_variation_type_default",
                AutoSkuSettings::new(AutoSkuMode::Enabled, "token", configuration).to_stored(),
            )
            .await
            .unwrap();
        let store = RacyStore {
            inner,
            races: Mutex::new(races),
        };
        AutoSkuContext::new(Arc::new(store), EntityTypeManager::new(default_entity_types()))
            .with_max_conflict_retries(retries)
    }

    #[tokio::test]
    async fn test_generated_sku_conflict_is_retried() {
        let context = racy_context(2, 5).await;
        let saved = AutoSkuService::new(&context)
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await
            .unwrap();
        assert_eq!(saved.sku_value(), "Shirt");
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let context = racy_context(3, 2).await;
        let result = AutoSkuService::new(&context)
            .save_variation(ProductVariation::new("default", "Shirt"), None)
            .await;
        assert!(matches!(result, Err(AutoSkuError::DuplicateSku(_))));
    }
}
