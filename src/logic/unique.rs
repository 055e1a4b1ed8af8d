use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::model::{ProductVariation, SKU_MAX_LENGTH};
use crate::store::traits::VariationStore;

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Strips markup and the control characters `\t \n \r \0 \x0B`.
pub fn clean_candidate(raw: &str) -> String {
    tag_regex()
        .replace_all(raw, "")
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r' | '\0' | '\u{0B}'))
        .collect()
}

/// First `max_chars` characters of `value`.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// `<base>_<counter>`, with the base shortened so the result fits `max_length`.
pub fn suffixed(base: &str, counter: u64, max_length: usize) -> String {
    let suffix = format!("_{}", counter);
    let room = max_length.saturating_sub(suffix.chars().count());
    format!("{}{}", truncate_chars(base, room), suffix)
}

/// Makes SKU candidates unique among the other entities of the same type.
pub struct UniquenessResolver<'a, S: VariationStore + ?Sized> {
    store: &'a S,
    max_length: usize,
}

impl<'a, S: VariationStore + ?Sized> UniquenessResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_length: SKU_MAX_LENGTH,
        }
    }

    /// True when no other entity of the same type uses `sku`.
    pub async fn is_unique(&self, entity: &ProductVariation, sku: &str) -> Result<bool> {
        Ok(!self.store.sku_in_use(&entity.entity_type, sku, entity.id).await?)
    }

    /// Cleans `raw` and tries `<base>`, `<base>_0`, `<base>_1`, ... until a
    /// free value is found.
    pub async fn make_unique(&self, entity: &ProductVariation, raw: &str) -> Result<String> {
        let base = clean_candidate(raw);
        let mut output = truncate_chars(&base, self.max_length);
        let mut counter: u64 = 0;

        while !self.is_unique(entity, &output).await? {
            output = suffixed(&base, counter, self.max_length);
            counter += 1;
        }

        if counter > 0 {
            log::debug!("SKU candidate '{}' taken, using '{}'", base, output);
        }
        Ok(output)
    }
}
