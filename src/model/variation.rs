use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{EntityId, PRODUCT_VARIATION};

fn default_entity_type() -> String {
    PRODUCT_VARIATION.to_string()
}

/// The product a variation belongs to. Only what tokens need is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReference {
    pub id: EntityId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariation {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    pub bundle: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductReference>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductVariation {
    pub fn new(bundle: &str, title: &str) -> Self {
        Self {
            id: None,
            entity_type: default_entity_type(),
            bundle: bundle.to_string(),
            sku: None,
            title: title.to_string(),
            product: None,
            attributes: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_sku(mut self, sku: &str) -> Self {
        self.sku = Some(sku.to_string());
        self
    }

    pub fn with_product(mut self, id: EntityId, title: &str) -> Self {
        self.product = Some(ProductReference {
            id,
            title: title.to_string(),
        });
        self
    }

    pub fn with_attribute(mut self, name: &str, value: serde_json::Value) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Current SKU, empty when unset.
    pub fn sku_value(&self) -> &str {
        self.sku.as_deref().unwrap_or("")
    }

    pub fn has_empty_sku(&self) -> bool {
        self.sku_value().trim().is_empty()
    }

    /// Writes a value into a named field. Unknown names land in `attributes`.
    pub fn set_field(&mut self, field_name: &str, value: String) {
        match field_name {
            "sku" => self.sku = Some(value),
            "title" => self.title = value,
            _ => {
                self.attributes
                    .insert(field_name.to_string(), serde_json::Value::String(value));
            }
        }
    }
}

/// A product variation type, the bundle entity of product variations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationType {
    pub id: String,
    pub label: String,
}

impl VariationType {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}
