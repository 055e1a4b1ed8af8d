use crate::model::{
    EntityTypeDefinition, FieldDefinition, VariationType, PRODUCT, PRODUCT_VARIATION, PRODUCT_VARIATION_TYPE,
    SKU_MAX_LENGTH,
};
use crate::store::traits::{Store, VariationTypeStore};
use anyhow::Result;

/// Entity types of the commerce catalog known to the service.
pub fn default_entity_types() -> Vec<EntityTypeDefinition> {
    vec![
        EntityTypeDefinition::new(PRODUCT_VARIATION, "Product variation")
            .with_bundle_entity_type(PRODUCT_VARIATION_TYPE)
            .with_key("id", "variation_id")
            .with_key("bundle", "type")
            .with_key("label", "title")
            .with_link_template(
                "edit-form",
                "/product/{commerce_product}/variations/{commerce_product_variation}/edit",
            )
            .with_field(FieldDefinition::integer("variation_id"))
            .with_field(FieldDefinition::entity_reference("type").required())
            .with_field(FieldDefinition::string("sku", SKU_MAX_LENGTH))
            .with_field(FieldDefinition::string("title", SKU_MAX_LENGTH))
            .with_field(FieldDefinition::entity_reference("product_id")),
        EntityTypeDefinition::new(PRODUCT_VARIATION_TYPE, "Product variation type")
            .with_key("id", "id")
            .with_key("label", "label")
            .with_link_template(
                "edit-form",
                "/admin/commerce/config/product-variation-types/{commerce_product_variation_type}/edit",
            )
            .with_link_template(
                "auto-sku",
                "/admin/commerce/config/product-variation-types/{commerce_product_variation_type}/auto-sku",
            ),
        EntityTypeDefinition::new(PRODUCT, "Product")
            .with_key("id", "product_id")
            .with_key("label", "title")
            .with_field(FieldDefinition::integer("product_id"))
            .with_field(FieldDefinition::string("title", SKU_MAX_LENGTH).required()),
    ]
}

/// Creates the `default` variation type that a fresh commerce install ships with.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    if store.get_variation_type("default").await?.is_some() {
        log::info!("Seed data already present");
        return Ok(());
    }

    store
        .upsert_variation_type(VariationType::new("default", "Default"))
        .await?;
    log::info!("Seeded variation type 'default'");
    Ok(())
}
