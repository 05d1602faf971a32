// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object (struct) and enum descriptors.
//!
//! Inheritance is expressed by embedding: a struct marks one field with
//! `#[reflect(parent)]` and the engine treats the embedded value's fields as
//! inherited fields of the outer type. [`ObjectInfo::fields`] lists the
//! type's own fields only; the parent chain is walked by the codec layer.

use super::{downcast_value, AnyValue, Reflect, TypeInfo};
use crate::error::{Error, Result};
use std::any::Any;
use std::collections::VecDeque;

/// Reads one field out of an erased owner value.
pub type FieldGetter = fn(&dyn Any) -> Option<&dyn AnyValue>;
/// Writes one decoded field into an erased owner value.
pub type FieldSetter = fn(&mut dyn Any, Box<dyn AnyValue>) -> Result<()>;
/// Borrows the embedded parent out of an erased owner value.
pub type ParentGetter = fn(&dyn Any) -> Option<&dyn AnyValue>;
/// Mutably borrows the embedded parent out of an erased owner value.
pub type ParentGetterMut = fn(&mut dyn Any) -> Option<&mut dyn Any>;
/// Builds an instance from positional field arguments.
pub type Constructor = fn(&mut FieldArgs) -> Result<Box<dyn AnyValue>>;
/// Builds a default instance that fields are then written into.
pub type DefaultFactory = fn() -> Box<dyn AnyValue>;

/// One declared field.
#[derive(Clone)]
pub struct FieldInfo {
    /// Declared (or renamed) field name.
    pub name: &'static str,
    pub type_info: fn() -> TypeInfo,
    pub get: FieldGetter,
    /// `None` for fields that can only be populated through a constructor.
    pub set: Option<FieldSetter>,
}

impl FieldInfo {
    pub fn new(name: &'static str, type_info: fn() -> TypeInfo, get: FieldGetter) -> Self {
        Self {
            name,
            type_info,
            get,
            set: None,
        }
    }

    pub fn with_setter(mut self, set: FieldSetter) -> Self {
        self.set = Some(set);
        self
    }
}

/// Link from a type to the type it extends.
#[derive(Clone)]
pub struct ParentInfo {
    pub type_info: fn() -> TypeInfo,
    pub get: ParentGetter,
    pub get_mut: ParentGetterMut,
}

/// Description of a struct with named fields.
#[derive(Clone)]
pub struct ObjectInfo {
    /// Own fields in declaration order (parent excluded).
    pub fields: Vec<FieldInfo>,
    pub parent: Option<ParentInfo>,
    /// Values declared with this type may carry a descendant at runtime.
    pub open: bool,
    /// Default-then-assign construction path.
    pub default: Option<DefaultFactory>,
    /// Construct-from-arguments path.
    pub construct: Option<Constructor>,
}

impl ObjectInfo {
    pub fn new(fields: Vec<FieldInfo>) -> Self {
        Self {
            fields,
            parent: None,
            open: false,
            default: None,
            construct: None,
        }
    }

    pub fn with_parent(mut self, parent: ParentInfo) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn with_default(mut self, default: DefaultFactory) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_constructor(mut self, construct: Constructor) -> Self {
        self.construct = Some(construct);
        self
    }

    /// Whether decoding can produce an instance at all.
    pub fn is_constructible(&self) -> bool {
        self.default.is_some() || self.construct.is_some()
    }
}

/// Description of a field-less enum.
#[derive(Clone)]
pub struct EnumInfo {
    pub variants: &'static [&'static str],
    pub index_of: fn(&dyn Any) -> Option<usize>,
    pub from_index: fn(usize) -> Option<Box<dyn AnyValue>>,
}

impl EnumInfo {
    /// Variant index for a name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| *v == name)
    }
}

/// One positional constructor argument.
struct FieldArg {
    owner: &'static str,
    field: &'static str,
    value: Option<Box<dyn AnyValue>>,
}

/// Decoded field values handed to a [`Constructor`].
///
/// Arguments are ordered like [`ObjectInfo::fields`] flattened along the
/// parent chain: own fields first, then the parent's (recursively). A
/// generated constructor takes its own fields with [`FieldArgs::take`] and
/// its parent with [`FieldArgs::take_parent`].
pub struct FieldArgs {
    args: VecDeque<FieldArg>,
}

impl FieldArgs {
    pub(crate) fn new() -> Self {
        Self {
            args: VecDeque::new(),
        }
    }

    pub(crate) fn push(
        &mut self,
        owner: &'static str,
        field: &'static str,
        value: Option<Box<dyn AnyValue>>,
    ) {
        self.args.push_back(FieldArg {
            owner,
            field,
            value,
        });
    }

    /// Number of arguments not yet consumed.
    pub fn remaining(&self) -> usize {
        self.args.len()
    }

    /// Consume the next argument as `T`.
    pub fn take<T: Any>(&mut self) -> Result<T> {
        let arg = self.args.pop_front().ok_or_else(|| Error::MissingField {
            type_name: std::any::type_name::<T>().to_string(),
            field: "<argument list exhausted>".to_string(),
        })?;
        match arg.value {
            Some(value) => downcast_value::<T>(value),
            None => Err(Error::MissingField {
                type_name: arg.owner.to_string(),
                field: arg.field.to_string(),
            }),
        }
    }

    /// Build the embedded parent from the following arguments.
    pub fn take_parent<P: Reflect + Any>(&mut self) -> Result<P> {
        let info = P::type_info();
        let construct = info
            .object()
            .and_then(|obj| obj.construct)
            .ok_or_else(|| Error::NoUsableConstructor(info.key().name().to_string()))?;
        let value = construct(self)?;
        downcast_value::<P>(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_in_order() {
        let mut args = FieldArgs::new();
        args.push("app::Point", "x", Some(Box::new(1i32)));
        args.push("app::Point", "y", Some(Box::new(2i32)));
        assert_eq!(args.remaining(), 2);
        assert_eq!(args.take::<i32>().unwrap(), 1);
        assert_eq!(args.take::<i32>().unwrap(), 2);
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn test_take_missing_reports_owner_and_field() {
        let mut args = FieldArgs::new();
        args.push("app::Point", "x", None);
        match args.take::<i32>() {
            Err(Error::MissingField { type_name, field }) => {
                assert_eq!(type_name, "app::Point");
                assert_eq!(field, "x");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_take_wrong_type() {
        let mut args = FieldArgs::new();
        args.push("app::Point", "x", Some(Box::new("one".to_string())));
        assert!(matches!(
            args.take::<i32>(),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_take_parent_requires_constructor() {
        let mut args = FieldArgs::new();
        assert!(matches!(
            args.take_parent::<u32>(),
            Err(Error::NoUsableConstructor(_))
        ));
    }
}
