use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn string(name: &str, max_length: usize) -> Self {
        Self {
            name: name.to_string(),
            field_type: "string".to_string(),
            max_length: Some(max_length),
            required: false,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: "integer".to_string(),
            max_length: None,
            required: false,
        }
    }

    pub fn entity_reference(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: "entity_reference".to_string(),
            max_length: None,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Description of an entity type: its keys, link templates and fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDefinition {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_entity_type: Option<String>,
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
    #[serde(default)]
    pub link_templates: BTreeMap<String, String>,
    /// Base fields shared by every bundle.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Additional fields attached to individual bundles.
    #[serde(default)]
    pub bundle_fields: BTreeMap<String, Vec<FieldDefinition>>,
}

impl EntityTypeDefinition {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            bundle_entity_type: None,
            keys: BTreeMap::new(),
            link_templates: BTreeMap::new(),
            fields: Vec::new(),
            bundle_fields: BTreeMap::new(),
        }
    }

    pub fn with_bundle_entity_type(mut self, bundle_entity_type: &str) -> Self {
        self.bundle_entity_type = Some(bundle_entity_type.to_string());
        self
    }

    pub fn with_key(mut self, key: &str, field: &str) -> Self {
        self.keys.insert(key.to_string(), field.to_string());
        self
    }

    pub fn with_link_template(mut self, rel: &str, path: &str) -> Self {
        self.link_templates.insert(rel.to_string(), path.to_string());
        self
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn key(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    pub fn has_link_template(&self, rel: &str) -> bool {
        self.link_templates.contains_key(rel)
    }

    pub fn link_template(&self, rel: &str) -> Option<&str> {
        self.link_templates.get(rel).map(String::as_str)
    }

    /// Base fields plus the fields attached to `bundle`.
    pub fn field_definitions(&self, bundle: &str) -> BTreeMap<&str, &FieldDefinition> {
        let mut fields: BTreeMap<&str, &FieldDefinition> = self
            .fields
            .iter()
            .map(|field| (field.name.as_str(), field))
            .collect();

        if let Some(extra) = self.bundle_fields.get(bundle) {
            for field in extra {
                fields.insert(field.name.as_str(), field);
            }
        }

        fields
    }
}

/// Read-only catalog of the entity types known to the service.
#[derive(Debug, Clone, Default)]
pub struct EntityTypeManager {
    definitions: BTreeMap<String, EntityTypeDefinition>,
}

impl EntityTypeManager {
    pub fn new(definitions: Vec<EntityTypeDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|definition| (definition.id.clone(), definition))
                .collect(),
        }
    }

    pub fn get_definition(&self, entity_type_id: &str) -> Option<&EntityTypeDefinition> {
        self.definitions.get(entity_type_id)
    }

    pub fn has_definition(&self, entity_type_id: &str) -> bool {
        self.definitions.contains_key(entity_type_id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EntityTypeDefinition> {
        self.definitions.values()
    }
}
