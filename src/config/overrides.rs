//! Per-page caption overrides.
//!
//! A page may carry a `caption:` key in its front matter with the same shape
//! as the `caption:` section of the site config. Every field is optional and
//! set fields win over the site-wide value.

use serde::Deserialize;

use super::types::{CaptionConfig, IdentifierConfig, Position};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptionOverrides {
    pub additional_identifier: Option<Vec<String>>,
    pub table: Option<IdentifierOverrides>,
    pub figure: Option<IdentifierOverrides>,
    pub custom: Option<IdentifierOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentifierOverrides {
    pub enable: Option<bool>,
    pub start_index: Option<i64>,
    pub increment_index: Option<i64>,
    pub position: Option<Position>,
    pub default_id: Option<String>,
    pub reference_text: Option<String>,
    pub caption_prefix: Option<String>,
    pub markdown_identifier: Option<String>,
    pub allow_indented_caption: Option<bool>,
    pub ignore_alt: Option<bool>,
    pub ignore_classes: Option<Vec<String>>,
    pub ignore_hash: Option<bool>,
}

impl CaptionOverrides {
    /// Read overrides from a page's `caption:` front matter value.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_value(value)
    }
}

impl CaptionConfig {
    /// The effective configuration of a page.
    pub fn with_overrides(&self, overrides: &CaptionOverrides) -> CaptionConfig {
        CaptionConfig {
            additional_identifier: overrides
                .additional_identifier
                .clone()
                .unwrap_or_else(|| self.additional_identifier.clone()),
            cross_reference_text: self.cross_reference_text.clone(),
            table: merge(&self.table, overrides.table.as_ref()),
            figure: merge(&self.figure, overrides.figure.as_ref()),
            custom: merge(&self.custom, overrides.custom.as_ref()),
        }
    }
}

fn merge(base: &IdentifierConfig, overrides: Option<&IdentifierOverrides>) -> IdentifierConfig {
    let Some(o) = overrides else {
        return base.clone();
    };
    let base = base.clone();
    IdentifierConfig {
        enable: o.enable.unwrap_or(base.enable),
        start_index: o.start_index.unwrap_or(base.start_index),
        increment_index: o.increment_index.unwrap_or(base.increment_index),
        position: o.position.unwrap_or(base.position),
        default_id: o.default_id.clone().unwrap_or(base.default_id),
        reference_text: o.reference_text.clone().unwrap_or(base.reference_text),
        caption_prefix: o.caption_prefix.clone().unwrap_or(base.caption_prefix),
        markdown_identifier: o
            .markdown_identifier
            .clone()
            .unwrap_or(base.markdown_identifier),
        allow_indented_caption: o
            .allow_indented_caption
            .unwrap_or(base.allow_indented_caption),
        ignore_alt: o.ignore_alt.unwrap_or(base.ignore_alt),
        ignore_classes: o.ignore_classes.clone().unwrap_or(base.ignore_classes),
        ignore_hash: o.ignore_hash.unwrap_or(base.ignore_hash),
    }
}
