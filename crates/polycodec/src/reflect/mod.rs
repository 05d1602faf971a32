// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type descriptors.
//!
//! Rust has no runtime reflection, so every type the engine can encode
//! describes itself through [`Reflect::type_info`]. The descriptor carries the
//! type identity ([`TypeKey`]) and its [`Shape`]: how to reach its fields,
//! elements or entries through type-erased accessors, and how to build it
//! back from decoded parts.
//!
//! # Features
//!
//! - **TypeKey**: `TypeId` + canonical name, hashed by `TypeId`
//! - **Shape**: scalar, enum, object, optional, pointer, array, collection,
//!   map, dynamic (`Dyn<B>`) and abstract declared types
//! - **AnyValue**: the erased value trait every codec works on
//! - **Derive**: `#[derive(Reflect)]` generates descriptors for structs/enums
//!
//! # Example
//!
//! ```rust
//! use polycodec::reflect::{Reflect, Shape};
//!
//! #[derive(polycodec::Reflect)]
//! struct SensorReading {
//!     sensor_id: u32,
//!     temperature: f64,
//!     location: String,
//! }
//!
//! let info = SensorReading::type_info();
//! match info.shape() {
//!     Shape::Object(obj) => assert_eq!(obj.fields.len(), 3),
//!     _ => unreachable!(),
//! }
//! ```

mod object;
mod scalar;
mod std_impls;

pub use object::{
    Constructor, DefaultFactory, EnumInfo, FieldArgs, FieldGetter, FieldInfo, FieldSetter,
    ObjectInfo, ParentGetter, ParentGetterMut, ParentInfo,
};
pub use scalar::{Scalar, ScalarInfo, ScalarKind, ScalarValue};
pub use std_impls::{Dyn, DynInfo, DynRef, MapInfo, OptionalInfo, PointerInfo, SequenceInfo};

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type-erased value handled by codecs.
///
/// Implemented for every `Any + Send + Sync` type. Call the methods through a
/// `&dyn AnyValue` (not through a `Box<dyn AnyValue>` receiver, which would
/// describe the box itself).
pub trait AnyValue: Any + Send + Sync + 'static {
    /// Borrow as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Borrow mutably as `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Convert an owned erased value into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    /// Canonical name of the concrete type.
    fn value_type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AnyValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Runtime `TypeId` of an erased value.
pub fn value_type_id(value: &dyn AnyValue) -> TypeId {
    value.as_any().type_id()
}

/// Unbox an erased value into `T`.
pub fn downcast_value<T: Any>(value: Box<dyn AnyValue>) -> Result<T> {
    downcast_box::<T>(value).map(|b| *b)
}

/// Convert an erased box into `Box<T>` without moving the value out.
pub fn downcast_box<T: Any>(value: Box<dyn AnyValue>) -> Result<Box<T>> {
    // Through the box: the blanket impl would otherwise name the Box itself.
    let found = (*value).value_type_name();
    value
        .into_any()
        .downcast::<T>()
        .map_err(|_| Error::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: found.to_string(),
        })
}

/// Borrow an erased decode target as `&mut T` (used by generated setters).
pub fn downcast_target<T: Any>(target: &mut dyn Any) -> Result<&mut T> {
    target.downcast_mut::<T>().ok_or_else(|| Error::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        found: "<decode target>".to_string(),
    })
}

/// Identity of a registered type.
///
/// Equality and hashing use the `TypeId` only; the name is the canonical
/// `std::any::type_name` and is used for diagnostics and type tags.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T` (sized or not).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Canonical (fully qualified) name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the canonical name, generics stripped.
    pub fn simple_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Types the engine can describe.
///
/// Usually derived with `#[derive(polycodec::Reflect)]`. Unsized declared-only
/// types (typically `dyn Trait`) implement it by hand with
/// [`TypeInfo::abstract_type`] so they can be the declared type of a
/// [`Dyn`] value.
pub trait Reflect: 'static {
    /// Describe the type.
    fn type_info() -> TypeInfo;
}

/// Structural description of a type.
#[derive(Clone)]
pub enum Shape {
    /// Primitive value (bool, integers, floats, char, String).
    Scalar(ScalarInfo),
    /// Field-less enum, encoded by variant name.
    Enum(EnumInfo),
    /// Struct with named fields.
    Object(ObjectInfo),
    /// `Option<T>`: the null-capable wrapper.
    Optional(OptionalInfo),
    /// `Box<T>` / `Arc<T>`: transparent indirection.
    Pointer(PointerInfo),
    /// Fixed-length array `[T; N]`.
    Array(SequenceInfo),
    /// Variable-length collection (`Vec`, `VecDeque`, sets).
    Collection(SequenceInfo),
    /// Key/value map.
    Map(MapInfo),
    /// `Dyn<B>`: declared type `B`, runtime type `B` or a descendant.
    Dynamic(DynInfo),
    /// Declared-only type; never instantiated directly.
    Abstract,
}

impl Shape {
    /// Short name of the shape, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Scalar(_) => "scalar",
            Shape::Enum(_) => "enum",
            Shape::Object(_) => "object",
            Shape::Optional(_) => "optional",
            Shape::Pointer(_) => "pointer",
            Shape::Array(_) => "array",
            Shape::Collection(_) => "collection",
            Shape::Map(_) => "map",
            Shape::Dynamic(_) => "dynamic",
            Shape::Abstract => "abstract",
        }
    }
}

/// A complete type descriptor.
#[derive(Clone)]
pub struct TypeInfo {
    key: TypeKey,
    shape: Shape,
    reflect: fn() -> TypeInfo,
}

impl TypeInfo {
    /// Create a descriptor for `T` with the given shape.
    pub fn new<T: Reflect + ?Sized>(shape: Shape) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape,
            reflect: <T as Reflect>::type_info,
        }
    }

    /// Descriptor of `T`.
    pub fn of<T: Reflect + ?Sized>() -> Self {
        T::type_info()
    }

    /// Descriptor for a declared-only type such as `dyn Trait`.
    pub fn abstract_type<T: Reflect + ?Sized>() -> Self {
        Self::new::<T>(Shape::Abstract)
    }

    /// Type identity.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Structural description.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Function producing this descriptor (stored inside [`Dyn`] values).
    pub fn reflect_fn(&self) -> fn() -> TypeInfo {
        self.reflect
    }

    /// Object description, if this is an object type.
    pub fn object(&self) -> Option<&ObjectInfo> {
        match &self.shape {
            Shape::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Shapes provided by the engine itself; never subject to the allow-list.
    pub fn is_builtin(&self) -> bool {
        !matches!(
            self.shape,
            Shape::Object(_) | Shape::Enum(_) | Shape::Abstract
        )
    }

    /// Whether values declared with this type may hold a different runtime type.
    pub fn is_open(&self) -> bool {
        match &self.shape {
            Shape::Object(obj) => obj.open,
            Shape::Abstract => true,
            _ => false,
        }
    }

    /// Whether `self` is `ancestor` or embeds it through its parent chain.
    pub fn descends_from(&self, ancestor: TypeKey) -> bool {
        if self.key == ancestor {
            return true;
        }
        let mut parent = self.object().and_then(|o| o.parent.clone());
        while let Some(p) = parent {
            let info = (p.type_info)();
            if info.key == ancestor {
                return true;
            }
            parent = info.object().and_then(|o| o.parent.clone());
        }
        false
    }

    /// Borrow the `ancestor` part of `value` (an instance of `self`) by
    /// following embedded parents.
    pub fn upcast<'a>(&self, value: &'a dyn AnyValue, ancestor: TypeKey) -> Option<&'a dyn AnyValue> {
        let mut current = value;
        let mut info = self.clone();
        while info.key != ancestor {
            let parent = info.object().and_then(|o| o.parent.clone())?;
            current = (parent.get)(current.as_any())?;
            info = (parent.type_info)();
        }
        Some(current)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("key", &self.key)
            .field("shape", &self.shape.kind_name())
            .finish()
    }
}
