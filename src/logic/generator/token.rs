use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::AutoSkuResult;
use crate::logic::expression::{split_template, Sandbox, Segment, BUILTIN_FUNCTIONS};
use crate::logic::generator::{merge_deep, GenerationInput, GeneratorDefinition, SkuGenerator};
use crate::logic::token::{ReplaceOptions, TokenData, TokenService, TOKEN_TYPES};
use crate::model::{FormErrors, FormField, FormFieldType, FormOption};

pub const TOKEN_GENERATOR: GeneratorDefinition = GeneratorDefinition {
    id: "token",
    label: "Token",
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TokenSettings {
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    evaluate: bool,
    #[serde(default)]
    allowed_functions: Vec<String>,
}

impl TokenSettings {
    fn from_configuration(configuration: &Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(configuration.clone())).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed token generator configuration: {}", e);
            Self {
                pattern: String::new(),
                evaluate: false,
                allowed_functions: Vec::new(),
            }
        })
    }

    fn sandbox(&self) -> Sandbox {
        Sandbox::new(self.allowed_functions.iter().cloned())
    }
}

/// Renders a token pattern such as
/// `[commerce_product_variation:product:title]-[commerce_product_variation:attribute_size]`.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    configuration: Map<String, Value>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        let mut generator = Self {
            configuration: Map::new(),
        };
        generator.configuration = generator.default_configuration();
        generator
    }
}

impl TokenGenerator {
    pub fn create(configuration: Map<String, Value>) -> Box<dyn SkuGenerator> {
        let mut generator = Self::default();
        generator.set_configuration(configuration);
        Box::new(generator)
    }
}

impl SkuGenerator for TokenGenerator {
    fn definition(&self) -> GeneratorDefinition {
        TOKEN_GENERATOR
    }

    fn default_configuration(&self) -> Map<String, Value> {
        let mut defaults = Map::new();
        defaults.insert("pattern".to_string(), json!(""));
        defaults.insert("evaluate".to_string(), json!(false));
        defaults.insert("allowed_functions".to_string(), json!(BUILTIN_FUNCTIONS));
        defaults
    }

    fn configuration(&self) -> &Map<String, Value> {
        &self.configuration
    }

    fn set_configuration(&mut self, configuration: Map<String, Value>) {
        self.configuration = merge_deep(self.default_configuration(), configuration);
    }

    fn configuration_form(&self) -> Vec<FormField> {
        let settings = TokenSettings::from_configuration(&self.configuration);
        let function_options = BUILTIN_FUNCTIONS
            .iter()
            .map(|f| FormOption {
                value: f.to_string(),
                label: f.to_string(),
            })
            .collect();

        vec![
            FormField {
                name: "pattern".to_string(),
                field_type: FormFieldType::Textarea,
                title: Some("Pattern for the SKU".to_string()),
                description: Some(
                    "Leave blank for using the per default generated SKU. Otherwise this string will be used as SKU. Use the syntax [token] if you want to insert a replacement pattern."
                        .to_string(),
                ),
                default_value: json!(settings.pattern),
                options: Vec::new(),
            },
            FormField {
                name: "token_help".to_string(),
                field_type: FormFieldType::TokenHelp,
                title: Some("Available tokens".to_string()),
                description: None,
                default_value: json!(TOKEN_TYPES),
                options: Vec::new(),
            },
            FormField {
                name: "evaluate".to_string(),
                field_type: FormFieldType::Checkbox,
                title: Some("Evaluate {{ }} expressions in the pattern".to_string()),
                description: Some(
                    "Expressions may only call the functions selected below, e.g. {{ upper([commerce_product_variation:product:title]) }}."
                        .to_string(),
                ),
                default_value: json!(settings.evaluate),
                options: Vec::new(),
            },
            FormField {
                name: "allowed_functions".to_string(),
                field_type: FormFieldType::Checkboxes,
                title: Some("Allowed functions".to_string()),
                description: None,
                default_value: json!(settings.allowed_functions),
                options: function_options,
            },
        ]
    }

    fn validate_configuration(&self, configuration: &Map<String, Value>) -> FormErrors {
        let mut errors = FormErrors::new();
        let merged = merge_deep(self.default_configuration(), configuration.clone());
        let settings = match serde_json::from_value::<TokenSettings>(Value::Object(merged)) {
            Ok(settings) => settings,
            Err(e) => {
                errors.insert("configuration".to_string(), format!("Malformed configuration: {}", e));
                return errors;
            }
        };

        if !settings.pattern.is_empty() && !TokenService::has_tokens(&settings.pattern) {
            errors.insert(
                "pattern".to_string(),
                "At least one token from available tokens list required".to_string(),
            );
        }

        if let Some(unknown) = settings
            .allowed_functions
            .iter()
            .find(|f| !BUILTIN_FUNCTIONS.contains(&f.as_str()))
        {
            errors.insert(
                "allowed_functions".to_string(),
                format!("Unknown function '{}'", unknown),
            );
        }

        if settings.evaluate {
            let sandbox = settings.sandbox();
            let checked = split_template(&settings.pattern).and_then(|segments| {
                segments.iter().try_for_each(|segment| match segment {
                    Segment::Expression(expr) => sandbox.check(expr),
                    Segment::Text(_) => Ok(()),
                })
            });
            if let Err(e) = checked {
                errors.entry("pattern".to_string()).or_insert_with(|| e.to_string());
            }
        }

        errors
    }

    fn raw_sku(&self, input: &GenerationInput<'_>) -> AutoSkuResult<String> {
        let settings = TokenSettings::from_configuration(&self.configuration);
        let data = TokenData {
            variation: Some(input.entity),
            bundle_label: Some(input.bundle_label),
            site: Some(input.site),
            user: input.user,
        };
        let options = ReplaceOptions { clear: true };

        if !settings.evaluate {
            return Ok(TokenService::replace(&settings.pattern, &data, options));
        }

        let rendered = settings.sandbox().render(
            &settings.pattern,
            &|text: &str| TokenService::replace(text, &data, options),
            &|token: &str| TokenService::replace_token(token, &data),
        )?;
        Ok(rendered)
    }
}
