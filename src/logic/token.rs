use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::logic::context::SiteInfo;
use crate::model::{ProductVariation, UserContext, PRODUCT_VARIATION};

/// Token types offered to administrators in the pattern help.
pub const TOKEN_TYPES: [&str; 3] = ["user", "site", PRODUCT_VARIATION];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\[([^\s\[\]:]+):([^\[\]]+)\]").expect("token pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Remove tokens that have no replacement instead of leaving them verbatim.
    pub clear: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self { clear: true }
    }
}

/// Objects tokens are resolved against.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenData<'a> {
    pub variation: Option<&'a ProductVariation>,
    /// Human readable name of the variation's bundle
    pub bundle_label: Option<&'a str>,
    pub site: Option<&'a SiteInfo>,
    pub user: Option<&'a UserContext>,
}

impl<'a> TokenData<'a> {
    pub fn value(&self, token_type: &str, name: &str) -> Option<String> {
        match token_type {
            PRODUCT_VARIATION => self.variation_value(name),
            "site" => self.site.and_then(|site| match name {
                "name" => Some(site.name.clone()),
                "url" => Some(site.url.clone()),
                _ => None,
            }),
            "user" => self.user.and_then(|user| match name {
                "id" | "uid" => Some(user.user_id.clone()),
                "name" | "display-name" => Some(user.display_name().to_string()),
                _ => None,
            }),
            _ => None,
        }
    }

    fn variation_value(&self, name: &str) -> Option<String> {
        let variation = self.variation?;

        match name {
            "id" => variation.id.map(|id| id.to_string()),
            "sku" => variation.sku.clone(),
            "title" => Some(variation.title.clone()),
            "type" | "bundle" => Some(variation.bundle.clone()),
            "type-name" => self.bundle_label.map(str::to_string),
            "product:id" | "product_id" => variation.product.as_ref().map(|p| p.id.to_string()),
            "product" | "product:title" => variation.product.as_ref().map(|p| p.title.clone()),
            _ => {
                let attribute = name.strip_prefix("attribute_").unwrap_or(name);
                variation.attributes.get(attribute).and_then(json_to_text)
            }
        }
    }
}

fn json_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(json_to_text).collect();
            Some(parts.join(", "))
        }
        other => Some(other.to_string()),
    }
}

pub struct TokenService;

impl TokenService {
    /// Token type -> (token name -> raw token) for every token in `text`.
    pub fn scan(text: &str) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut tokens: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for caps in token_regex().captures_iter(text) {
            tokens
                .entry(caps[1].to_string())
                .or_default()
                .insert(caps[2].to_string(), caps[0].to_string());
        }
        tokens
    }

    pub fn has_tokens(text: &str) -> bool {
        token_regex().is_match(text)
    }

    pub fn replace(text: &str, data: &TokenData<'_>, options: ReplaceOptions) -> String {
        token_regex()
            .replace_all(text, |caps: &Captures| {
                match data.value(&caps[1], &caps[2]) {
                    Some(value) => value,
                    None if options.clear => String::new(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Replacement for one raw token such as `[site:name]`.
    pub fn replace_token(token: &str, data: &TokenData<'_>) -> String {
        Self::replace(token, data, ReplaceOptions { clear: true })
    }
}
