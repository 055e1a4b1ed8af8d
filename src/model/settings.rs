use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSkuMode {
    #[default]
    Disabled,
    Enabled,
    Optional,
}

impl AutoSkuMode {
    pub const ALL: [AutoSkuMode; 3] = [AutoSkuMode::Disabled, AutoSkuMode::Enabled, AutoSkuMode::Optional];

    pub fn as_str(&self) -> &'static str {
        match self {
            AutoSkuMode::Disabled => "disabled",
            AutoSkuMode::Enabled => "enabled",
            AutoSkuMode::Optional => "optional",
        }
    }

    /// Administrator-facing description used by the settings form.
    pub fn label(&self) -> &'static str {
        match self {
            AutoSkuMode::Disabled => "Disabled",
            AutoSkuMode::Enabled => "Automatically generate the SKU and hide the SKU field",
            AutoSkuMode::Optional => "Automatically generate the SKU if the SKU field is left empty",
        }
    }

    fn from_legacy_status(status: &Value) -> Self {
        match status {
            Value::Number(n) => match n.as_u64() {
                Some(1) => AutoSkuMode::Enabled,
                Some(2) => AutoSkuMode::Optional,
                _ => AutoSkuMode::Disabled,
            },
            Value::String(s) => match s.as_str() {
                "1" | "enabled" => AutoSkuMode::Enabled,
                "2" | "optional" => AutoSkuMode::Optional,
                _ => AutoSkuMode::Disabled,
            },
            Value::Bool(true) => AutoSkuMode::Enabled,
            _ => AutoSkuMode::Disabled,
        }
    }
}

impl std::fmt::Display for AutoSkuMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auto SKU configuration of one bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoSkuSettings {
    #[serde(default)]
    pub mode: AutoSkuMode,
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(default)]
    pub configuration: Map<String, Value>,
}

/// Shape written by the first generation of the module: a bare token
/// pattern plus a flag that enabled evaluating it as code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyAutoSkuSettings {
    pub status: Value,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub php: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum StoredAutoSkuSettings {
    Legacy(LegacyAutoSkuSettings),
    Current(AutoSkuSettings),
}

pub const TOKEN_GENERATOR_ID: &str = "token";

impl From<LegacyAutoSkuSettings> for AutoSkuSettings {
    fn from(legacy: LegacyAutoSkuSettings) -> Self {
        if legacy.php {
            log::warn!(
                "Legacy auto SKU settings request code evaluation; the pattern is used as a plain token pattern instead"
            );
        }

        let mut configuration = Map::new();
        configuration.insert("pattern".to_string(), Value::String(legacy.pattern));

        Self {
            mode: AutoSkuMode::from_legacy_status(&legacy.status),
            plugin: Some(TOKEN_GENERATOR_ID.to_string()),
            configuration,
        }
    }
}

impl AutoSkuSettings {
    pub fn new(mode: AutoSkuMode, plugin: &str, configuration: Map<String, Value>) -> Self {
        Self {
            mode,
            plugin: Some(plugin.to_string()),
            configuration,
        }
    }

    /// Decodes persisted settings, accepting both the current and the legacy shape.
    pub fn from_stored(value: Value) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_value::<StoredAutoSkuSettings>(value)? {
            StoredAutoSkuSettings::Legacy(legacy) => legacy.into(),
            StoredAutoSkuSettings::Current(settings) => settings,
        })
    }

    pub fn to_stored(&self) -> Value {
        serde_json::json!({
            "mode": self.mode,
            "plugin": self.plugin,
            "configuration": self.configuration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_settings_decode() {
        let settings = AutoSkuSettings::from_stored(json!({
            "mode": "optional",
            "plugin": "token",
            "configuration": {"pattern": "[commerce_product_variation:title]"}
        }))
        .unwrap();

        assert_eq!(settings.mode, AutoSkuMode::Optional);
        assert_eq!(settings.plugin.as_deref(), Some("token"));
        assert_eq!(
            settings.configuration["pattern"],
            json!("[commerce_product_variation:title]")
        );
    }

    #[test]
    fn test_empty_object_decodes_to_disabled() {
        let settings = AutoSkuSettings::from_stored(json!({})).unwrap();
        assert_eq!(settings, AutoSkuSettings::default());
    }

    #[test]
    fn test_legacy_settings_convert_to_token_plugin() {
        let settings = AutoSkuSettings::from_stored(json!({
            "status": 1,
            "pattern": "[commerce_product_variation:product:title]",
            "php": true
        }))
        .unwrap();

        assert_eq!(settings.mode, AutoSkuMode::Enabled);
        assert_eq!(settings.plugin.as_deref(), Some(TOKEN_GENERATOR_ID));
        assert_eq!(
            settings.configuration["pattern"],
            json!("[commerce_product_variation:product:title]")
        );
        assert!(!settings.configuration.contains_key("evaluate"));
    }

    #[test]
    fn test_legacy_status_strings() {
        let optional = AutoSkuSettings::from_stored(json!({"status": "2", "pattern": ""})).unwrap();
        assert_eq!(optional.mode, AutoSkuMode::Optional);

        let disabled = AutoSkuSettings::from_stored(json!({"status": 0})).unwrap();
        assert_eq!(disabled.mode, AutoSkuMode::Disabled);
    }

    #[test]
    fn test_stored_form_round_trips_through_decoder() {
        let mut configuration = Map::new();
        configuration.insert("pattern".to_string(), json!("SKU-[commerce_product_variation:id]"));
        let settings = AutoSkuSettings::new(AutoSkuMode::Enabled, "token", configuration);

        let decoded = AutoSkuSettings::from_stored(settings.to_stored()).unwrap();
        assert_eq!(decoded, settings);
    }
}
