// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Policies consulted while building codecs: field naming, collection
//! sizing and type proxies.

use crate::error::Result;
use crate::reflect::{downcast_value, AnyValue, TypeInfo, TypeKey};
use std::any::Any;
use std::collections::HashSet;

/// Resolves the external name of a field that may collide with a field of a
/// more derived type.
pub trait FieldNaming: Send + Sync {
    /// `depth` is 0 for the type's own fields, 1 for its parent's, and so on.
    /// `taken` holds the names already claimed by more derived types.
    fn resolve(&self, field: &str, depth: usize, taken: &HashSet<String>) -> String;
}

/// Default naming: a shadowed field gets `prefix` once per inheritance level,
/// then once more until the name is unique.
#[derive(Debug, Clone)]
pub struct PrefixShadowed {
    prefix: String,
}

impl PrefixShadowed {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixShadowed {
    fn default() -> Self {
        Self::new("_")
    }
}

impl FieldNaming for PrefixShadowed {
    fn resolve(&self, field: &str, depth: usize, taken: &HashSet<String>) -> String {
        if !taken.contains(field) {
            return field.to_string();
        }
        let mut name = format!("{}{}", self.prefix.repeat(depth.max(1)), field);
        while taken.contains(&name) {
            name.insert_str(0, &self.prefix);
        }
        name
    }
}

/// How a decode buffer grows past its pre-allocated capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Double the capacity.
    Double,
    /// Add a fixed number of slots.
    Linear(usize),
}

impl Growth {
    /// Capacity after one growth step from `current`.
    pub fn next_capacity(&self, current: usize) -> usize {
        match self {
            Growth::Double => current.saturating_mul(2).max(1),
            Growth::Linear(step) => current.saturating_add((*step).max(1)),
        }
    }
}

/// Pre-allocation policy for decoded arrays, collections and maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSizing {
    /// Capacity used when the representation does not declare a count.
    pub default_capacity: usize,
    /// Upper bound on pre-allocation, whatever the declared count says.
    pub max_preallocate: usize,
    pub growth: Growth,
}

impl Default for CollectionSizing {
    fn default() -> Self {
        Self {
            default_capacity: 16,
            max_preallocate: 4096,
            growth: Growth::Double,
        }
    }
}

impl CollectionSizing {
    /// Capacity to reserve before decoding `declared` elements.
    pub fn initial_capacity(&self, declared: Option<usize>) -> usize {
        declared
            .unwrap_or(self.default_capacity)
            .min(self.max_preallocate)
    }
}

/// Substitution of a type by a proxy type on the wire.
#[derive(Clone, Copy)]
pub struct ProxySpec {
    pub target: TypeKey,
    pub proxy: fn() -> TypeInfo,
    pub to_proxy: fn(&dyn Any) -> Option<Box<dyn AnyValue>>,
    pub from_proxy: fn(Box<dyn AnyValue>) -> Result<Box<dyn AnyValue>>,
}

pub(crate) fn to_proxy<A, P>(value: &dyn Any) -> Option<Box<dyn AnyValue>>
where
    A: Any,
    P: AnyValue + for<'a> From<&'a A>,
{
    value
        .downcast_ref::<A>()
        .map(|a| Box::new(P::from(a)) as Box<dyn AnyValue>)
}

pub(crate) fn from_proxy<A, P>(value: Box<dyn AnyValue>) -> Result<Box<dyn AnyValue>>
where
    A: AnyValue + From<P>,
    P: Any,
{
    let proxy = downcast_value::<P>(value)?;
    Ok(Box::new(A::from(proxy)))
}
