// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptors for standard library containers and the `Dyn<B>` wrapper.

use super::{downcast_box, downcast_value, AnyValue, Reflect, Shape, TypeInfo, TypeKey};
use crate::error::{Error, Result};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

// ============================================================================
// Option<T>
// ============================================================================

/// Erased accessors for `Option<T>`.
#[derive(Clone, Copy)]
pub struct OptionalInfo {
    pub inner: fn() -> TypeInfo,
    /// `None` if the value is not this option type; `Some(None)` for a null.
    pub get: fn(&dyn Any) -> Option<Option<&dyn AnyValue>>,
    pub wrap: fn(Option<Box<dyn AnyValue>>) -> Result<Box<dyn AnyValue>>,
    pub none: fn() -> Box<dyn AnyValue>,
}

fn option_get<T: AnyValue>(value: &dyn Any) -> Option<Option<&dyn AnyValue>> {
    value
        .downcast_ref::<Option<T>>()
        .map(|opt| opt.as_ref().map(|v| v as &dyn AnyValue))
}

fn option_wrap<T: AnyValue>(value: Option<Box<dyn AnyValue>>) -> Result<Box<dyn AnyValue>> {
    let value: Option<T> = match value {
        Some(inner) => Some(downcast_value::<T>(inner)?),
        None => None,
    };
    Ok(Box::new(value))
}

fn option_none<T: AnyValue>() -> Box<dyn AnyValue> {
    Box::new(None::<T>)
}

impl<T: Reflect + AnyValue> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Optional(OptionalInfo {
            inner: T::type_info,
            get: option_get::<T>,
            wrap: option_wrap::<T>,
            none: option_none::<T>,
        }))
    }
}

// ============================================================================
// Box<T> / Arc<T>
// ============================================================================

/// Erased accessors for a transparent pointer.
#[derive(Clone, Copy)]
pub struct PointerInfo {
    pub inner: fn() -> TypeInfo,
    pub get: fn(&dyn Any) -> Option<&dyn AnyValue>,
    pub wrap: fn(Box<dyn AnyValue>) -> Result<Box<dyn AnyValue>>,
}

fn box_get<T: AnyValue>(value: &dyn Any) -> Option<&dyn AnyValue> {
    value
        .downcast_ref::<Box<T>>()
        .map(|b| &**b as &dyn AnyValue)
}

fn box_wrap<T: AnyValue>(value: Box<dyn AnyValue>) -> Result<Box<dyn AnyValue>> {
    let inner: Box<T> = downcast_box::<T>(value)?;
    Ok(Box::new(inner))
}

fn arc_get<T: AnyValue>(value: &dyn Any) -> Option<&dyn AnyValue> {
    value
        .downcast_ref::<Arc<T>>()
        .map(|a| &**a as &dyn AnyValue)
}

fn arc_wrap<T: AnyValue>(value: Box<dyn AnyValue>) -> Result<Box<dyn AnyValue>> {
    let inner: Arc<T> = Arc::from(downcast_box::<T>(value)?);
    Ok(Box::new(inner))
}

impl<T: Reflect + AnyValue> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Pointer(PointerInfo {
            inner: T::type_info,
            get: box_get::<T>,
            wrap: box_wrap::<T>,
        }))
    }
}

impl<T: Reflect + AnyValue> Reflect for Arc<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Pointer(PointerInfo {
            inner: T::type_info,
            get: arc_get::<T>,
            wrap: arc_wrap::<T>,
        }))
    }
}

// ============================================================================
// Arrays and collections
// ============================================================================

/// Erased accessors for arrays and collections.
#[derive(Clone, Copy)]
pub struct SequenceInfo {
    pub element: fn() -> TypeInfo,
    /// Required element count for fixed-length arrays.
    pub fixed_len: Option<usize>,
    pub items: fn(&dyn Any) -> Option<Vec<&dyn AnyValue>>,
    pub build: fn(Vec<Box<dyn AnyValue>>) -> Result<Box<dyn AnyValue>>,
}

fn seq_items<C, T>(value: &dyn Any) -> Option<Vec<&dyn AnyValue>>
where
    C: Any,
    T: AnyValue,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    value
        .downcast_ref::<C>()
        .map(|c| c.into_iter().map(|item| item as &dyn AnyValue).collect())
}

fn seq_build<C, T>(items: Vec<Box<dyn AnyValue>>) -> Result<Box<dyn AnyValue>>
where
    C: FromIterator<T> + AnyValue,
    T: AnyValue,
{
    let collection = items
        .into_iter()
        .map(downcast_value::<T>)
        .collect::<Result<C>>()?;
    Ok(Box::new(collection))
}

fn array_build<T: AnyValue, const N: usize>(
    items: Vec<Box<dyn AnyValue>>,
) -> Result<Box<dyn AnyValue>> {
    let values = items
        .into_iter()
        .map(downcast_value::<T>)
        .collect::<Result<Vec<T>>>()?;
    let len = values.len();
    let array: [T; N] = values.try_into().map_err(|_| {
        Error::malformed(format!("array expects {} elements, found {}", N, len))
    })?;
    Ok(Box::new(array))
}

fn collection_info<C, T>() -> SequenceInfo
where
    C: FromIterator<T> + AnyValue,
    T: Reflect + AnyValue,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    SequenceInfo {
        element: T::type_info,
        fixed_len: None,
        items: seq_items::<C, T>,
        build: seq_build::<C, T>,
    }
}

impl<T: Reflect + AnyValue, const N: usize> Reflect for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Array(SequenceInfo {
            element: T::type_info,
            fixed_len: Some(N),
            items: seq_items::<[T; N], T>,
            build: array_build::<T, N>,
        }))
    }
}

impl<T: Reflect + AnyValue> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Collection(collection_info::<Self, T>()))
    }
}

impl<T: Reflect + AnyValue> Reflect for VecDeque<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Collection(collection_info::<Self, T>()))
    }
}

impl<T: Reflect + AnyValue + Eq + Hash> Reflect for HashSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Collection(collection_info::<Self, T>()))
    }
}

impl<T: Reflect + AnyValue + Ord> Reflect for BTreeSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Collection(collection_info::<Self, T>()))
    }
}

// ============================================================================
// Maps
// ============================================================================

/// Erased accessors for key/value maps.
#[derive(Clone, Copy)]
pub struct MapInfo {
    pub key: fn() -> TypeInfo,
    pub value: fn() -> TypeInfo,
    pub entries: fn(&dyn Any) -> Option<Vec<(&dyn AnyValue, &dyn AnyValue)>>,
    pub build: fn(Vec<(Box<dyn AnyValue>, Box<dyn AnyValue>)>) -> Result<Box<dyn AnyValue>>,
}

fn map_entries<M, K, V>(value: &dyn Any) -> Option<Vec<(&dyn AnyValue, &dyn AnyValue)>>
where
    M: Any,
    K: AnyValue,
    V: AnyValue,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
{
    value.downcast_ref::<M>().map(|m| {
        m.into_iter()
            .map(|(k, v)| (k as &dyn AnyValue, v as &dyn AnyValue))
            .collect()
    })
}

fn map_build<M, K, V>(entries: Vec<(Box<dyn AnyValue>, Box<dyn AnyValue>)>) -> Result<Box<dyn AnyValue>>
where
    M: FromIterator<(K, V)> + AnyValue,
    K: AnyValue,
    V: AnyValue,
{
    let map = entries
        .into_iter()
        .map(|(k, v)| Ok((downcast_value::<K>(k)?, downcast_value::<V>(v)?)))
        .collect::<Result<M>>()?;
    Ok(Box::new(map))
}

fn map_info<M, K, V>() -> MapInfo
where
    M: FromIterator<(K, V)> + AnyValue,
    K: Reflect + AnyValue,
    V: Reflect + AnyValue,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
{
    MapInfo {
        key: K::type_info,
        value: V::type_info,
        entries: map_entries::<M, K, V>,
        build: map_build::<M, K, V>,
    }
}

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + AnyValue + Eq + Hash,
    V: Reflect + AnyValue,
{
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Map(map_info::<Self, K, V>()))
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + AnyValue + Ord,
    V: Reflect + AnyValue,
{
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Map(map_info::<Self, K, V>()))
    }
}

// ============================================================================
// Dyn<B>
// ============================================================================

/// A value declared as `B` whose runtime type is `B` or a type descending
/// from `B` (through `#[reflect(parent)]` embedding).
///
/// `B` may be an unsized abstract type such as `dyn Animal`, in which case
/// the runtime type is any registered concrete type.
///
/// # Example
///
/// ```rust
/// use polycodec::{Dyn, Reflect};
///
/// #[derive(Reflect, Default)]
/// #[reflect(open, default)]
/// struct Animal { name: String }
///
/// #[derive(Reflect, Default)]
/// #[reflect(default)]
/// struct Dog {
///     #[reflect(parent)]
///     base: Animal,
///     breed: String,
/// }
///
/// let pet: Dyn<Animal> = Dyn::new(Dog { base: Animal::default(), breed: "lab".into() });
/// assert!(pet.is::<Dog>());
/// assert_eq!(pet.downcast_ref::<Dog>().map(|d| d.breed.as_str()), Some("lab"));
/// ```
pub struct Dyn<B: ?Sized + 'static> {
    value: Box<dyn AnyValue>,
    key: TypeKey,
    info: fn() -> TypeInfo,
    _declared: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized + 'static> Dyn<B> {
    /// Wrap a concrete value.
    pub fn new<T: Reflect + AnyValue>(value: T) -> Self {
        Self {
            value: Box::new(value),
            key: TypeKey::of::<T>(),
            info: T::type_info,
            _declared: PhantomData,
        }
    }

    pub(crate) fn from_parts(value: Box<dyn AnyValue>, key: TypeKey, info: fn() -> TypeInfo) -> Self {
        Self {
            value,
            key,
            info,
            _declared: PhantomData,
        }
    }

    /// Runtime type of the wrapped value.
    pub fn runtime_type(&self) -> TypeKey {
        self.key
    }

    /// Descriptor of the runtime type.
    pub fn runtime_info(&self) -> TypeInfo {
        (self.info)()
    }

    /// Borrow the erased value.
    pub fn value(&self) -> &dyn AnyValue {
        &*self.value
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value().as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value().as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (*self.value).as_any_mut().downcast_mut::<T>()
    }

    /// Take the wrapped value out as `T`, if that is its runtime type.
    pub fn into_inner<T: Any>(self) -> Option<T> {
        self.value.into_any().downcast::<T>().ok().map(|b| *b)
    }

    /// Take the erased value out.
    pub fn into_boxed(self) -> Box<dyn AnyValue> {
        self.value
    }
}

impl<B: ?Sized + 'static> fmt::Debug for Dyn<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dyn")
            .field("declared", &std::any::type_name::<B>())
            .field("runtime", &self.key.name())
            .finish()
    }
}

impl<B: Reflect + AnyValue + Default> Default for Dyn<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

/// Borrowed view of a `Dyn<B>` value.
#[derive(Clone, Copy)]
pub struct DynRef<'a> {
    pub value: &'a dyn AnyValue,
    pub key: TypeKey,
    pub info: fn() -> TypeInfo,
}

/// Erased accessors for `Dyn<B>`.
#[derive(Clone, Copy)]
pub struct DynInfo {
    /// Declared type `B`.
    pub base: fn() -> TypeInfo,
    pub inner: fn(&dyn Any) -> Option<DynRef<'_>>,
    pub wrap: fn(Box<dyn AnyValue>, TypeKey, fn() -> TypeInfo) -> Box<dyn AnyValue>,
}

fn dyn_inner<B: ?Sized + 'static>(value: &dyn Any) -> Option<DynRef<'_>> {
    value.downcast_ref::<Dyn<B>>().map(|d| DynRef {
        value: d.value(),
        key: d.key,
        info: d.info,
    })
}

fn dyn_wrap<B: ?Sized + 'static>(
    value: Box<dyn AnyValue>,
    key: TypeKey,
    info: fn() -> TypeInfo,
) -> Box<dyn AnyValue> {
    Box::new(Dyn::<B>::from_parts(value, key, info))
}

impl<B: Reflect + ?Sized> Reflect for Dyn<B> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Dynamic(DynInfo {
            base: B::type_info,
            inner: dyn_inner::<B>,
            wrap: dyn_wrap::<B>,
        }))
    }
}
