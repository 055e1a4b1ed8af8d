use std::collections::BTreeMap;

use crate::logic::settings_form::{SETTINGS_FORM_ID, SETTINGS_FORM_TITLE};
use crate::model::{AdminRoute, EntityTypeDefinition, EntityTypeManager, LocalTask, Permission, RouteParameter};

pub const AUTO_SKU_LINK_TEMPLATE: &str = "auto-sku";

pub fn permission_name(entity_type_id: &str) -> String {
    format!("administer {} SKU", entity_type_id)
}

pub fn route_name(entity_type_id: &str) -> String {
    format!("entity.{}.auto_sku", entity_type_id)
}

/// Settings form route of one entity type, if it declares an `auto-sku` link template.
pub fn auto_sku_route(definition: &EntityTypeDefinition) -> Option<AdminRoute> {
    let path = definition.link_template(AUTO_SKU_LINK_TEMPLATE)?;
    let mut parameters = BTreeMap::new();
    parameters.insert(
        definition.id.clone(),
        RouteParameter {
            parameter_type: format!("entity:{}", definition.id),
        },
    );

    Some(AdminRoute {
        name: route_name(&definition.id),
        path: path.to_string(),
        title: SETTINGS_FORM_TITLE.to_string(),
        form: SETTINGS_FORM_ID.to_string(),
        entity_type_id: definition.id.clone(),
        permission: permission_name(&definition.id),
        admin_route: true,
        parameters,
    })
}

pub fn auto_sku_routes(entity_types: &EntityTypeManager) -> Vec<AdminRoute> {
    entity_types.definitions().filter_map(auto_sku_route).collect()
}

/// One permission per entity type that has both an `auto-sku` link template and a label key.
pub fn auto_sku_permissions(entity_types: &EntityTypeManager) -> Vec<Permission> {
    entity_types
        .definitions()
        .filter(|definition| definition.has_link_template(AUTO_SKU_LINK_TEMPLATE) && definition.has_key("label"))
        .map(|definition| Permission {
            name: permission_name(&definition.id),
            title: format!("{}: Administer automatic SKU", definition.label),
            restrict_access: true,
        })
        .collect()
}

pub fn auto_sku_local_tasks(entity_types: &EntityTypeManager) -> Vec<LocalTask> {
    entity_types
        .definitions()
        .filter(|definition| definition.has_link_template(AUTO_SKU_LINK_TEMPLATE))
        .map(|definition| LocalTask {
            id: format!("{}.auto_sku_tab", definition.id),
            route_name: route_name(&definition.id),
            title: SETTINGS_FORM_TITLE.to_string(),
            base_route: format!("entity.{}.edit_form", definition.id),
            weight: 100,
        })
        .collect()
}

/// Converts `{name}` placeholders of a link template into axum `:name` segments.
pub fn axum_path(template: &str) -> String {
    template
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => format!(":{}", name),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
