use crate::error::{AutoSkuError, AutoSkuResult};
use crate::logic::context::AutoSkuContext;
use crate::logic::manager::{load_settings, mode_options};
use crate::model::{
    settings_key, AutoSkuMode, AutoSkuSettings, ConfigurationElement, FormAction, FormErrors, FormOption, FormView,
    RadiosElement, SettingsSubmission, VariationType,
};
use crate::store::traits::{SettingsStore, Store, VariationTypeStore};

pub const SETTINGS_FORM_ID: &str = "commerce_autosku_settings_form";
pub const SETTINGS_FORM_TITLE: &str = "Automatic SKU";

/// Per-bundle auto SKU settings form.
pub struct SettingsForm<'a, S: Store> {
    context: &'a AutoSkuContext<S>,
}

impl<'a, S: Store> SettingsForm<'a, S> {
    pub fn new(context: &'a AutoSkuContext<S>) -> Self {
        Self { context }
    }

    async fn load_bundle(&self, bundle_entity_type: &str, bundle: &str) -> AutoSkuResult<VariationType> {
        if !self.context.entity_types.has_definition(bundle_entity_type) {
            return Err(AutoSkuError::EntityTypeNotFound(bundle_entity_type.to_string()));
        }
        self.context
            .store
            .get_variation_type(bundle)
            .await?
            .ok_or_else(|| AutoSkuError::BundleNotFound(bundle.to_string()))
    }

    fn plugin_options(&self) -> Vec<FormOption> {
        self.context
            .generators
            .definitions()
            .into_iter()
            .map(|definition| FormOption {
                value: definition.id.to_string(),
                label: definition.label.to_string(),
            })
            .collect()
    }

    pub async fn build(&self, bundle_entity_type: &str, bundle: &str) -> AutoSkuResult<FormView> {
        let bundle = self.load_bundle(bundle_entity_type, bundle).await?;
        let settings = load_settings(
            self.context.store.as_ref(),
            &settings_key(bundle_entity_type, &bundle.id),
        )
        .await?;

        let mut view = FormView {
            form_id: SETTINGS_FORM_ID.to_string(),
            title: SETTINGS_FORM_TITLE.to_string(),
            bundle: bundle.id.clone(),
            mode: RadiosElement {
                title: None,
                options: mode_options(),
                default_value: Some(settings.mode.as_str().to_string()),
                required: false,
            },
            plugin: None,
            configuration: None,
            actions: vec![FormAction {
                name: "submit".to_string(),
                value: "Save configuration".to_string(),
                button_type: "primary".to_string(),
            }],
        };

        // A stored plugin that is no longer registered hides the plugin section.
        if let Some(plugin_id) = settings.plugin.as_deref() {
            if !self.context.generators.has_definition(plugin_id) {
                log::warn!(
                    "Bundle '{}' references unknown SKU generator '{}'",
                    bundle.id,
                    plugin_id
                );
                return Ok(view);
            }
        }

        view.plugin = Some(RadiosElement {
            title: Some("Plugin".to_string()),
            options: self.plugin_options(),
            default_value: settings.plugin.clone(),
            required: true,
        });

        if let Some(plugin_id) = settings.plugin {
            let generator = self
                .context
                .generators
                .create_instance(&plugin_id, settings.configuration)?;
            view.configuration = Some(ConfigurationElement {
                plugin_id,
                fields: generator.configuration_form(),
            });
        }

        Ok(view)
    }

    /// Validates the submitted values and persists them as the bundle's settings.
    pub async fn submit(
        &self,
        bundle_entity_type: &str,
        bundle: &str,
        submission: SettingsSubmission,
    ) -> AutoSkuResult<AutoSkuSettings> {
        let bundle = self.load_bundle(bundle_entity_type, bundle).await?;
        let mut errors = FormErrors::new();

        let configuration = match submission.plugin.as_deref() {
            Some(plugin_id) if self.context.generators.has_definition(plugin_id) => {
                let mut generator = self
                    .context
                    .generators
                    .create_instance(plugin_id, serde_json::Map::new())?;
                for (field, message) in generator.validate_configuration(&submission.configuration) {
                    errors.insert(format!("configuration.{}", field), message);
                }
                generator.set_configuration(submission.configuration);
                generator.configuration().clone()
            }
            Some(plugin_id) => {
                errors.insert(
                    "plugin".to_string(),
                    format!("The \"{}\" plugin is not available", plugin_id),
                );
                submission.configuration
            }
            None => {
                if submission.mode != AutoSkuMode::Disabled {
                    errors.insert("plugin".to_string(), "Plugin field is required.".to_string());
                }
                submission.configuration
            }
        };

        if !errors.is_empty() {
            return Err(AutoSkuError::InvalidConfiguration(errors));
        }

        let settings = AutoSkuSettings {
            mode: submission.mode,
            plugin: submission.plugin,
            configuration,
        };
        self.context
            .store
            .set_bundle_settings(&settings_key(bundle_entity_type, &bundle.id), settings.to_stored())
            .await?;

        log::info!(
            "Auto SKU for '{}' set to {} ({})",
            bundle.id,
            settings.mode,
            settings.plugin.as_deref().unwrap_or("no plugin")
        );
        Ok(settings)
    }
}
