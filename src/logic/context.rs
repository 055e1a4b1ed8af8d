use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logic::registry::GeneratorRegistry;
use crate::model::EntityTypeManager;
use crate::store::traits::Store;

/// Site-wide values exposed through the `site` token type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Commerce".to_string(),
            url: "http://localhost".to_string(),
        }
    }
}

/// Everything the auto SKU services need, passed explicitly instead of
/// being looked up from a service container.
pub struct AutoSkuContext<S: Store> {
    pub store: Arc<S>,
    pub entity_types: Arc<EntityTypeManager>,
    pub generators: Arc<GeneratorRegistry>,
    pub site: SiteInfo,
    /// How many times a save is retried after losing a SKU race.
    pub max_conflict_retries: u32,
}

impl<S: Store> AutoSkuContext<S> {
    pub fn new(store: Arc<S>, entity_types: EntityTypeManager) -> Self {
        Self {
            store,
            entity_types: Arc::new(entity_types),
            generators: Arc::new(GeneratorRegistry::new()),
            site: SiteInfo::default(),
            max_conflict_retries: 5,
        }
    }

    pub fn with_site(mut self, site: SiteInfo) -> Self {
        self.site = site;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }
}
