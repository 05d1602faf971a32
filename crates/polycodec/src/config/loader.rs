// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML configuration loader.
//!
//! Types cannot be named from a document, so a YAML file only carries the
//! string-addressable part of a configuration; types are still registered
//! in code and the document is applied on top of the builder.
//!
//! # Example YAML
//!
//! ```yaml
//! # codec.yaml
//! allowed_prefixes:
//!   - my_app::model
//! aliases:
//!   Dog: my_app::model::Dog
//! dynamic_type_tags: true
//! fail_on_unrecognised_fields: false
//! shadow_prefix: "_"
//! sizing:
//!   default_capacity: 32
//!   max_preallocate: 8192
//!   growth: linear
//!   growth_step: 64
//! ```

use super::{CodecConfigBuilder, CollectionSizing, Growth, PrefixShadowed};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// YAML configuration loader.
pub struct YamlLoader;

/// Root YAML document structure.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct YamlCodecDocument {
    /// Module path prefixes added to the allow-list.
    pub allowed_prefixes: Vec<String>,

    /// Alias -> canonical type path. Targets must be registered in code.
    pub aliases: BTreeMap<String, String>,

    pub dynamic_type_tags: Option<bool>,

    pub fail_on_no_type_constructor: Option<bool>,

    pub fail_on_unrecognised_fields: Option<bool>,

    /// Prefix used by the default field naming for shadowed fields.
    pub shadow_prefix: Option<String>,

    /// Collection pre-allocation policy
    pub sizing: Option<YamlSizing>,
}

/// Collection sizing section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct YamlSizing {
    pub default_capacity: Option<usize>,
    pub max_preallocate: Option<usize>,
    /// `double` or `linear`
    pub growth: Option<String>,
    /// Step for `linear` growth
    pub growth_step: Option<usize>,
}

impl YamlLoader {
    /// Load a configuration document from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<YamlCodecDocument> {
        let yaml_content = fs::read_to_string(path)?;
        Self::parse_yaml(&yaml_content)
    }

    /// Parse YAML content.
    pub fn parse_yaml(yaml_content: &str) -> Result<YamlCodecDocument> {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse YAML: {}", e)))
    }

    /// Apply a parsed document onto a builder.
    pub fn apply(doc: &YamlCodecDocument, mut builder: CodecConfigBuilder) -> Result<CodecConfigBuilder> {
        for prefix in &doc.allowed_prefixes {
            builder = builder.allow_prefix(prefix.clone());
        }
        for (alias, canonical) in &doc.aliases {
            builder = builder.alias_name(alias.clone(), canonical.clone());
        }
        if let Some(enabled) = doc.dynamic_type_tags {
            builder = builder.dynamic_type_tags(enabled);
        }
        if let Some(enabled) = doc.fail_on_no_type_constructor {
            builder = builder.fail_on_no_type_constructor(enabled);
        }
        if let Some(enabled) = doc.fail_on_unrecognised_fields {
            builder = builder.fail_on_unrecognised_fields(enabled);
        }
        if let Some(ref prefix) = doc.shadow_prefix {
            if prefix.is_empty() {
                return Err(Error::InvalidConfig("shadow_prefix must not be empty".into()));
            }
            builder = builder.field_naming(PrefixShadowed::new(prefix.clone()));
        }
        if let Some(ref sizing) = doc.sizing {
            builder = builder.sizing(Self::sizing_to_policy(sizing)?);
        }
        log::debug!(
            "[YamlLoader::apply] {} prefixes, {} aliases",
            doc.allowed_prefixes.len(),
            doc.aliases.len()
        );
        Ok(builder)
    }

    /// Convert the sizing section.
    pub fn sizing_to_policy(sizing: &YamlSizing) -> Result<CollectionSizing> {
        let mut policy = CollectionSizing::default();
        if let Some(capacity) = sizing.default_capacity {
            policy.default_capacity = capacity;
        }
        if let Some(max) = sizing.max_preallocate {
            policy.max_preallocate = max;
        }
        if let Some(ref growth) = sizing.growth {
            policy.growth = match growth.to_lowercase().as_str() {
                "double" => Growth::Double,
                "linear" => Growth::Linear(sizing.growth_step.unwrap_or(16)),
                other => {
                    return Err(Error::InvalidConfig(format!("Invalid growth policy: {}", other)))
                }
            };
        }
        Ok(policy)
    }
}

impl CodecConfigBuilder {
    /// Apply a YAML document given as a string.
    pub fn yaml_str(self, yaml_content: &str) -> Result<Self> {
        let doc = YamlLoader::parse_yaml(yaml_content)?;
        YamlLoader::apply(&doc, self)
    }

    /// Apply a YAML document read from a file.
    pub fn yaml_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let doc = YamlLoader::load_from_file(path)?;
        YamlLoader::apply(&doc, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use std::io::Write;

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
allowed_prefixes: ["app::model"]
aliases:
  Dog: app::model::Dog
dynamic_type_tags: false
fail_on_unrecognised_fields: false
shadow_prefix: "p_"
sizing:
  default_capacity: 4
  growth: linear
  growth_step: 8
"#;
        let doc = YamlLoader::parse_yaml(yaml).unwrap();
        assert_eq!(doc.allowed_prefixes, vec!["app::model".to_string()]);
        assert_eq!(doc.aliases.get("Dog").map(String::as_str), Some("app::model::Dog"));
        assert_eq!(doc.dynamic_type_tags, Some(false));
        assert_eq!(doc.fail_on_no_type_constructor, None);

        let sizing = YamlLoader::sizing_to_policy(doc.sizing.as_ref().unwrap()).unwrap();
        assert_eq!(sizing.default_capacity, 4);
        assert_eq!(sizing.max_preallocate, 4096);
        assert_eq!(sizing.growth, Growth::Linear(8));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            YamlLoader::parse_yaml("allowed_prefix: [x]"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_growth() {
        let sizing = YamlSizing {
            growth: Some("triple".into()),
            ..Default::default()
        };
        assert!(YamlLoader::sizing_to_policy(&sizing).is_err());
    }

    #[test]
    fn test_apply_flags() {
        let config = CodecConfig::builder()
            .yaml_str("fail_on_unrecognised_fields: false\ndynamic_type_tags: false")
            .unwrap()
            .build()
            .unwrap();
        assert!(!config.fail_on_unrecognised_fields());
        assert!(!config.dynamic_type_tags());
        assert!(config.fail_on_no_type_constructor());
    }

    #[test]
    fn test_unregistered_alias_fails_build() {
        let builder = CodecConfig::builder()
            .yaml_str("aliases:\n  Ghost: nowhere::Ghost")
            .unwrap();
        assert!(matches!(builder.build(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "allowed_prefixes: [\"app\"]").unwrap();
        let config = CodecConfig::builder()
            .yaml_file(file.path())
            .unwrap()
            .build()
            .unwrap();
        assert!(config.has_allow_list());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            YamlLoader::load_from_file("/definitely/not/here.yaml"),
            Err(Error::Io(_))
        ));
    }
}
