use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub title: String,
    pub restrict_access: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteParameter {
    #[serde(rename = "type")]
    pub parameter_type: String,
}

/// Administrative route serving the auto SKU settings form of one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRoute {
    pub name: String,
    pub path: String,
    pub title: String,
    pub form: String,
    pub entity_type_id: String,
    pub permission: String,
    pub admin_route: bool,
    pub parameters: BTreeMap<String, RouteParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalTask {
    pub id: String,
    pub route_name: String,
    pub title: String,
    pub base_route: String,
    pub weight: i32,
}
