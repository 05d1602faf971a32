// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive values.

use super::{AnyValue, Reflect, Shape, TypeInfo};
use std::any::Any;

/// Primitive kinds understood by every format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
}

impl ScalarKind {
    /// Encoded size in bytes for fixed-size kinds; `None` for strings.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ScalarKind::Bool | ScalarKind::I8 | ScalarKind::U8 => Some(1),
            ScalarKind::I16 | ScalarKind::U16 => Some(2),
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 | ScalarKind::Char => Some(4),
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => Some(8),
            ScalarKind::String => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
        }
    }
}

/// An owned primitive value moving between a type and a format.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::String(_) => ScalarKind::String,
        }
    }

    /// String payload, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Rust types that map onto one [`ScalarKind`].
pub trait ScalarValue: AnyValue + Sized {
    const KIND: ScalarKind;

    fn to_scalar(&self) -> Scalar;

    fn from_scalar(value: Scalar) -> Option<Self>;
}

/// Erased accessors for a scalar type.
#[derive(Clone, Copy)]
pub struct ScalarInfo {
    pub kind: ScalarKind,
    pub to_scalar: fn(&dyn Any) -> Option<Scalar>,
    pub from_scalar: fn(Scalar) -> Option<Box<dyn AnyValue>>,
}

impl ScalarInfo {
    pub fn of<T: ScalarValue>() -> Self {
        Self {
            kind: T::KIND,
            to_scalar: scalar_get::<T>,
            from_scalar: scalar_make::<T>,
        }
    }
}

fn scalar_get<T: ScalarValue>(value: &dyn Any) -> Option<Scalar> {
    value.downcast_ref::<T>().map(T::to_scalar)
}

fn scalar_make<T: ScalarValue>(value: Scalar) -> Option<Box<dyn AnyValue>> {
    T::from_scalar(value).map(|v| Box::new(v) as Box<dyn AnyValue>)
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl ScalarValue for $ty {
            const KIND: ScalarKind = ScalarKind::$variant;

            fn to_scalar(&self) -> Scalar {
                Scalar::$variant(*self)
            }

            fn from_scalar(value: Scalar) -> Option<Self> {
                match value {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl Reflect for $ty {
            fn type_info() -> TypeInfo {
                TypeInfo::new::<$ty>(Shape::Scalar(ScalarInfo::of::<$ty>()))
            }
        }
    };
}

impl_scalar!(bool, Bool);
impl_scalar!(i8, I8);
impl_scalar!(i16, I16);
impl_scalar!(i32, I32);
impl_scalar!(i64, I64);
impl_scalar!(u8, U8);
impl_scalar!(u16, U16);
impl_scalar!(u32, U32);
impl_scalar!(u64, U64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);
impl_scalar!(char, Char);

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn to_scalar(&self) -> Scalar {
        Scalar::String(self.clone())
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::String(v) => Some(v),
            _ => None,
        }
    }
}

impl Reflect for String {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<String>(Shape::Scalar(ScalarInfo::of::<String>()))
    }
}
