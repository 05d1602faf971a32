// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable codec configuration.
//!
//! A [`CodecConfig`] is assembled once through [`CodecConfigBuilder`] and then
//! shared read-only by every codec of a [`crate::CodecCore`].
//!
//! # Example
//!
//! ```rust
//! use polycodec::{CodecConfig, Reflect};
//!
//! #[derive(Reflect, Default)]
//! #[reflect(open, default)]
//! struct Animal { name: String }
//!
//! let config = CodecConfig::builder()
//!     .alias::<Animal>("Animal")
//!     .allow_prefix(module_path!())
//!     .fail_on_unrecognised_fields(false)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.type_name(polycodec::TypeKey::of::<Animal>()), "Animal");
//! ```

#[cfg(feature = "config-loaders")]
pub mod loader;
mod policy;

pub use policy::{CollectionSizing, FieldNaming, Growth, PrefixShadowed, ProxySpec};

use crate::error::{Error, Result};
use crate::reflect::{AnyValue, Reflect, Shape, TypeInfo, TypeKey};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Read-only policy consulted during codec generation and dispatch.
pub struct CodecConfig {
    /// Canonical name -> descriptor of every registered type.
    registered: HashMap<&'static str, fn() -> TypeInfo>,
    /// Alias -> descriptor.
    aliases: HashMap<String, fn() -> TypeInfo>,
    /// Type -> alias (reverse of `aliases`).
    names: HashMap<TypeId, String>,
    allow_list: Option<AllowList>,
    proxies: HashMap<TypeId, ProxySpec>,
    default_impls: HashMap<TypeId, fn() -> TypeInfo>,
    field_naming: Arc<dyn FieldNaming>,
    sizing: CollectionSizing,
    dynamic_type_tags: bool,
    fail_on_no_type_constructor: bool,
    fail_on_unrecognised_fields: bool,
}

#[derive(Debug, Default)]
struct AllowList {
    types: HashSet<TypeId>,
    prefixes: Vec<String>,
}

impl AllowList {
    fn permits(&self, key: TypeKey) -> bool {
        if self.types.contains(&key.id()) {
            return true;
        }
        let name = key.name();
        self.prefixes.iter().any(|prefix| {
            name == prefix
                || (name.starts_with(prefix.as_str()) && name[prefix.len()..].starts_with("::"))
        })
    }
}

impl CodecConfig {
    /// Start building a configuration.
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }

    fn empty() -> Self {
        Self {
            registered: HashMap::new(),
            aliases: HashMap::new(),
            names: HashMap::new(),
            allow_list: None,
            proxies: HashMap::new(),
            default_impls: HashMap::new(),
            field_naming: Arc::new(PrefixShadowed::default()),
            sizing: CollectionSizing::default(),
            dynamic_type_tags: true,
            fail_on_no_type_constructor: true,
            fail_on_unrecognised_fields: true,
        }
    }

    // ========================================================================
    // Allow-list
    // ========================================================================

    /// Whether values of this type may be instantiated while decoding.
    ///
    /// Engine-provided shapes and abstract declared types are always allowed;
    /// objects and enums must match the allow-list when one is configured.
    pub fn is_allowed(&self, info: &TypeInfo) -> bool {
        if info.is_builtin() || matches!(info.shape(), Shape::Abstract) {
            return true;
        }
        self.allow_list
            .as_ref()
            .map_or(true, |list| list.permits(info.key()))
    }

    /// Fail with [`Error::DisallowedType`] unless [`Self::is_allowed`].
    pub fn check_allowed(&self, info: &TypeInfo) -> Result<()> {
        if self.is_allowed(info) {
            Ok(())
        } else {
            log::debug!("[CodecConfig::check_allowed] rejected {}", info.key().name());
            Err(Error::DisallowedType(info.key().name().to_string()))
        }
    }

    /// Whether an allow-list is configured at all.
    pub fn has_allow_list(&self) -> bool {
        self.allow_list.is_some()
    }

    // ========================================================================
    // Type names
    // ========================================================================

    /// External name of a type: its alias, or its canonical name.
    pub fn type_name(&self, key: TypeKey) -> &str {
        self.names
            .get(&key.id())
            .map(String::as_str)
            .unwrap_or_else(|| key.name())
    }

    /// Resolve an external name: aliases first, then registered canonical
    /// names.
    pub fn resolve_name(&self, name: &str) -> Result<TypeInfo> {
        if let Some(info) = self.aliases.get(name) {
            return Ok(info());
        }
        if let Some(info) = self.registered.get(name) {
            return Ok(info());
        }
        Err(Error::UnresolvableTypeName(name.to_string()))
    }

    /// Number of types resolvable by name.
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    // ========================================================================
    // Substitutions
    // ========================================================================

    pub fn proxy_for(&self, key: TypeKey) -> Option<&ProxySpec> {
        self.proxies.get(&key.id())
    }

    /// Concrete type decoded for an abstract declared type when no tag is
    /// present.
    pub fn default_impl_for(&self, key: TypeKey) -> Option<TypeInfo> {
        self.default_impls.get(&key.id()).map(|info| info())
    }

    // ========================================================================
    // Policies and flags
    // ========================================================================

    pub fn field_naming(&self) -> &dyn FieldNaming {
        &*self.field_naming
    }

    pub fn sizing(&self) -> CollectionSizing {
        self.sizing
    }

    pub fn dynamic_type_tags(&self) -> bool {
        self.dynamic_type_tags
    }

    pub fn fail_on_no_type_constructor(&self) -> bool {
        self.fail_on_no_type_constructor
    }

    pub fn fail_on_unrecognised_fields(&self) -> bool {
        self.fail_on_unrecognised_fields
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecConfig")
            .field("registered", &self.registered.len())
            .field("aliases", &self.aliases.len())
            .field("allow_list", &self.allow_list)
            .field("proxies", &self.proxies.len())
            .field("default_impls", &self.default_impls.len())
            .field("sizing", &self.sizing)
            .field("dynamic_type_tags", &self.dynamic_type_tags)
            .field("fail_on_no_type_constructor", &self.fail_on_no_type_constructor)
            .field("fail_on_unrecognised_fields", &self.fail_on_unrecognised_fields)
            .finish()
    }
}

/// Builder for [`CodecConfig`].
pub struct CodecConfigBuilder {
    registered: Vec<fn() -> TypeInfo>,
    aliases: Vec<(String, fn() -> TypeInfo)>,
    alias_names: Vec<(String, String)>,
    allow_list: Option<AllowList>,
    proxies: Vec<ProxySpec>,
    default_impls: Vec<(TypeKey, fn() -> TypeInfo)>,
    field_naming: Option<Arc<dyn FieldNaming>>,
    sizing: CollectionSizing,
    dynamic_type_tags: bool,
    fail_on_no_type_constructor: bool,
    fail_on_unrecognised_fields: bool,
}

impl Default for CodecConfigBuilder {
    fn default() -> Self {
        Self {
            registered: Vec::new(),
            aliases: Vec::new(),
            alias_names: Vec::new(),
            allow_list: None,
            proxies: Vec::new(),
            default_impls: Vec::new(),
            field_naming: None,
            sizing: CollectionSizing::default(),
            dynamic_type_tags: true,
            fail_on_no_type_constructor: true,
            fail_on_unrecognised_fields: true,
        }
    }
}

impl CodecConfigBuilder {
    /// Make `T` resolvable by its canonical name in type tags.
    pub fn register<T: Reflect + ?Sized>(mut self) -> Self {
        self.registered.push(T::type_info);
        self
    }

    /// Register `T` under an external alias.
    pub fn alias<T: Reflect + ?Sized>(mut self, name: impl Into<String>) -> Self {
        self.registered.push(T::type_info);
        self.aliases.push((name.into(), T::type_info));
        self
    }

    /// Alias a type known only by canonical name; resolved by [`Self::build`]
    /// against the registered types.
    pub fn alias_name(mut self, name: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.alias_names.push((name.into(), canonical.into()));
        self
    }

    /// Allow instantiating `T` while decoding. Enables the allow-list.
    pub fn allow_type<T: Reflect + ?Sized>(mut self) -> Self {
        self.allow_list
            .get_or_insert_with(AllowList::default)
            .types
            .insert(TypeId::of::<T>());
        self
    }

    /// Allow every type whose canonical path starts with `prefix` (a module
    /// path such as `my_app::model`). Enables the allow-list.
    pub fn allow_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allow_list
            .get_or_insert_with(AllowList::default)
            .prefixes
            .push(prefix.into());
        self
    }

    /// Encode and decode `A` through its proxy `P`.
    pub fn proxy<A, P>(mut self) -> Self
    where
        A: Reflect + AnyValue + From<P>,
        P: Reflect + AnyValue + for<'a> From<&'a A>,
    {
        self.proxies.push(ProxySpec {
            target: TypeKey::of::<A>(),
            proxy: P::type_info,
            to_proxy: policy::to_proxy::<A, P>,
            from_proxy: policy::from_proxy::<A, P>,
        });
        self
    }

    /// Decode `T` for declared type `B` when no type tag is present.
    pub fn default_impl<B, T>(mut self) -> Self
    where
        B: Reflect + ?Sized,
        T: Reflect + AnyValue,
    {
        self.registered.push(T::type_info);
        self.default_impls.push((TypeKey::of::<B>(), T::type_info));
        self
    }

    pub fn field_naming(mut self, naming: impl FieldNaming + 'static) -> Self {
        self.field_naming = Some(Arc::new(naming));
        self
    }

    pub fn sizing(mut self, sizing: CollectionSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Write and honour dynamic type tags (default: on).
    pub fn dynamic_type_tags(mut self, enabled: bool) -> Self {
        self.dynamic_type_tags = enabled;
        self
    }

    /// Fail codec generation for types with no construction path (default: on).
    pub fn fail_on_no_type_constructor(mut self, enabled: bool) -> Self {
        self.fail_on_no_type_constructor = enabled;
        self
    }

    /// Fail decoding on unknown field names (default: on).
    pub fn fail_on_unrecognised_fields(mut self, enabled: bool) -> Self {
        self.fail_on_unrecognised_fields = enabled;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<CodecConfig> {
        let mut config = CodecConfig::empty();

        for info in self.registered {
            let key = info().key();
            config.registered.insert(key.name(), info);
        }

        for (name, info) in self.aliases {
            config.bind_alias(name, info)?;
        }

        for (name, canonical) in self.alias_names {
            let info = config
                .registered
                .get(canonical.as_str())
                .copied()
                .ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "alias '{}' targets unregistered type '{}'",
                        name, canonical
                    ))
                })?;
            config.bind_alias(name, info)?;
        }

        for spec in self.proxies {
            if config.proxies.insert(spec.target.id(), spec).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "duplicate proxy for {}",
                    spec.target.name()
                )));
            }
        }

        for (base, info) in self.default_impls {
            config.default_impls.insert(base.id(), info);
        }

        config.allow_list = self.allow_list;
        if let Some(naming) = self.field_naming {
            config.field_naming = naming;
        }
        config.sizing = self.sizing;
        config.dynamic_type_tags = self.dynamic_type_tags;
        config.fail_on_no_type_constructor = self.fail_on_no_type_constructor;
        config.fail_on_unrecognised_fields = self.fail_on_unrecognised_fields;

        log::debug!(
            "[CodecConfig::build] {} registered, {} aliases, allow-list={}, tags={}",
            config.registered_count(),
            config.aliases.len(),
            config.allow_list.is_some(),
            config.dynamic_type_tags
        );
        Ok(config)
    }
}

impl CodecConfig {
    fn bind_alias(&mut self, name: String, info: fn() -> TypeInfo) -> Result<()> {
        let key = info().key();
        if let Some(existing) = self.aliases.get(&name) {
            if existing().key() != key {
                return Err(Error::InvalidConfig(format!(
                    "alias '{}' bound to two types",
                    name
                )));
            }
        }
        if let Some(existing) = self.names.get(&key.id()) {
            if *existing != name {
                return Err(Error::InvalidConfig(format!(
                    "type {} has two aliases: '{}' and '{}'",
                    key.name(),
                    existing,
                    name
                )));
            }
        }
        self.names.insert(key.id(), name.clone());
        self.aliases.insert(name, info);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::ObjectInfo;

    struct Widget;

    impl Reflect for Widget {
        fn type_info() -> TypeInfo {
            TypeInfo::new::<Self>(Shape::Object(ObjectInfo::new(Vec::new())))
        }
    }

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert!(config.dynamic_type_tags());
        assert!(config.fail_on_no_type_constructor());
        assert!(config.fail_on_unrecognised_fields());
        assert!(!config.has_allow_list());
        assert!(config.is_allowed(&Widget::type_info()));
    }

    #[test]
    fn test_alias_round_trip() {
        let config = CodecConfig::builder()
            .alias::<Widget>("W")
            .build()
            .unwrap();
        assert_eq!(config.type_name(TypeKey::of::<Widget>()), "W");
        assert_eq!(
            config.resolve_name("W").unwrap().key(),
            TypeKey::of::<Widget>()
        );
        // canonical name still resolves
        let canonical = std::any::type_name::<Widget>();
        assert!(config.resolve_name(canonical).is_ok());
        assert!(matches!(
            config.resolve_name("Nope"),
            Err(Error::UnresolvableTypeName(_))
        ));
    }

    #[test]
    fn test_alias_name_requires_registration() {
        let err = CodecConfig::builder()
            .alias_name("W", "no::such::Type")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let config = CodecConfig::builder()
            .register::<Widget>()
            .alias_name("W", std::any::type_name::<Widget>())
            .build()
            .unwrap();
        assert_eq!(config.type_name(TypeKey::of::<Widget>()), "W");
    }

    #[test]
    fn test_conflicting_aliases_rejected() {
        let err = CodecConfig::builder()
            .alias::<Widget>("A")
            .alias::<Widget>("B")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_allow_prefix_matches_path_segments() {
        let config = CodecConfig::builder()
            .allow_prefix(module_path!())
            .build()
            .unwrap();
        assert!(config.is_allowed(&Widget::type_info()));
        // builtin shapes are never restricted
        assert!(config.is_allowed(&TypeInfo::of::<Vec<u8>>()));

        let list = AllowList {
            types: HashSet::new(),
            prefixes: vec!["app::mod".to_string()],
        };
        assert!(!list.permits(TypeKey::of::<Widget>()));
    }

    #[test]
    fn test_allow_list_rejects() {
        let config = CodecConfig::builder()
            .allow_prefix("somewhere::else")
            .build()
            .unwrap();
        assert!(matches!(
            config.check_allowed(&Widget::type_info()),
            Err(Error::DisallowedType(_))
        ));
    }
}
