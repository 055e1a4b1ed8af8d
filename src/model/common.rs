pub type EntityId = i64;

/// Storage length of the SKU field.
pub const SKU_MAX_LENGTH: usize = 255;

pub const PRODUCT: &str = "commerce_product";
pub const PRODUCT_VARIATION: &str = "commerce_product_variation";
pub const PRODUCT_VARIATION_TYPE: &str = "commerce_product_variation_type";

/// Key under which bundle-level auto SKU settings are persisted,
/// e.g. `commerce_product_variation_type_default`.
pub fn settings_key(bundle_entity_type: &str, bundle_id: &str) -> String {
    format!("{}_{}", bundle_entity_type, bundle_id)
}
