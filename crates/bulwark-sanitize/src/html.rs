use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Tags whose content ammonia always drops; they can never be allow-listed
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

const DATA_ATTRIBUTE_PREFIX: &str = "data-";

/// Allow-list used when rebuilding untrusted HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationPolicy {
    /// Tag names kept in the output
    pub tags: Vec<String>,
    /// Attribute names kept on any allowed tag
    pub attributes: Vec<String>,
    /// Whether `data-*` attributes survive
    pub allow_data_attributes: bool,
}

impl Default for SanitizationPolicy {
    fn default() -> Self {
        Self {
            tags: ["b", "i", "em", "strong", "a", "p", "br"].map(str::to_owned).to_vec(),
            attributes: ["href", "title"].map(str::to_owned).to_vec(),
            allow_data_attributes: false,
        }
    }
}

/// Partial policy; every field left out keeps the default
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverride {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
    #[serde(default)]
    pub allow_data_attributes: Option<bool>,
}

impl SanitizationPolicy {
    /// Merge an override over the default policy
    pub fn merged(overrides: &PolicyOverride) -> Self {
        let defaults = Self::default();

        Self {
            tags: overrides.tags.clone().unwrap_or(defaults.tags),
            attributes: overrides.attributes.clone().unwrap_or(defaults.attributes),
            allow_data_attributes: overrides.allow_data_attributes.unwrap_or(defaults.allow_data_attributes),
        }
    }

    /// Rebuild `input` keeping only allow-listed tags and attributes
    pub fn clean(&self, input: &str) -> String {
        let tags: HashSet<&str> = self
            .tags
            .iter()
            .map(String::as_str)
            .filter(|tag| !RAW_TEXT_TAGS.contains(tag))
            .collect();

        let attributes: HashSet<&str> = self
            .attributes
            .iter()
            .map(String::as_str)
            .filter(|attr| self.allow_data_attributes || !attr.starts_with(DATA_ATTRIBUTE_PREFIX))
            .collect();

        let mut builder = ammonia::Builder::default();
        builder
            .tags(tags)
            .tag_attributes(HashMap::new())
            .generic_attributes(attributes)
            .link_rel(None);

        if self.allow_data_attributes {
            builder.generic_attribute_prefixes(HashSet::from([DATA_ATTRIBUTE_PREFIX]));
        }

        builder.clean(input).to_string()
    }
}

/// Sanitize an HTML fragment against the default policy merged with `overrides`
pub fn sanitize_html(input: &str, overrides: Option<&PolicyOverride>) -> String {
    overrides
        .map_or_else(SanitizationPolicy::default, SanitizationPolicy::merged)
        .clean(input)
}
