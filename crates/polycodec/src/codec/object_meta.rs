// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field composition for object types.
//!
//! [`ObjectMeta`] is the ordered, collision-resolved list of [`FieldCodec`]s
//! of one type, walked outward along its parent chain: the type's own fields
//! first, then its parent's, and so on. Formats build their object codecs on
//! top of it and never touch field accessors directly.

use super::CodecHandle;
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{
    AnyValue, Constructor, DefaultFactory, FieldArgs, FieldInfo, ParentInfo, Shape, TypeInfo,
    TypeKey,
};
use std::any::Any;
use std::collections::{HashMap, HashSet};

/// One field of an object: external name, accessor path and nested codec.
pub struct FieldCodec<F: CodecFormat> {
    name: String,
    declaring: TypeKey,
    /// Inheritance depth of the declaring type (0 = the object itself).
    depth: usize,
    /// Parents to traverse from the object down to the declaring type.
    path: Vec<ParentInfo>,
    field: FieldInfo,
    field_type: TypeKey,
    codec: CodecHandle<F>,
    /// Value used when the representation omits a nullable field.
    missing: Option<fn() -> Box<dyn AnyValue>>,
}

impl<F: CodecFormat> FieldCodec<F> {
    /// External (collision-resolved) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as declared on the Rust type.
    pub fn declared_name(&self) -> &'static str {
        self.field.name
    }

    pub fn declaring_type(&self) -> TypeKey {
        self.declaring
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn field_type(&self) -> TypeKey {
        self.field_type
    }

    pub fn codec(&self) -> &CodecHandle<F> {
        &self.codec
    }

    /// Borrow this field out of an instance of the object type.
    pub fn get<'a>(&self, owner: &'a dyn Any) -> Result<&'a dyn AnyValue> {
        let mut target: &'a dyn Any = owner;
        for parent in &self.path {
            target = (parent.get)(target)
                .ok_or_else(|| self.access_error())?
                .as_any();
        }
        (self.field.get)(target).ok_or_else(|| self.access_error())
    }

    fn set(&self, owner: &mut dyn Any, value: Box<dyn AnyValue>) -> Result<()> {
        let setter = self.field.set.ok_or_else(|| {
            Error::NoUsableConstructor(format!(
                "{}.{} has no setter",
                self.declaring.name(),
                self.field.name
            ))
        })?;
        let mut target: &mut dyn Any = owner;
        for parent in &self.path {
            target = (parent.get_mut)(target).ok_or_else(|| self.access_error())?;
        }
        setter(target, value)
    }

    fn access_error(&self) -> Error {
        Error::TypeMismatch {
            expected: self.declaring.name().to_string(),
            found: format!("owner of field '{}'", self.name),
        }
    }

    /// Encode this field of `owner` through the full dispatch protocol.
    pub fn encode(&self, core: &CodecCore<F>, owner: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        let value = self.get(owner.as_any())?;
        self.codec.encode_with_check(core, value, out)
    }

    /// Decode one value of this field.
    pub fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        self.codec.decode_with_check(core, input)
    }
}

/// How decoded fields become an instance.
#[derive(Clone, Copy)]
pub enum Construction {
    /// Start from a default instance and assign fields through setters.
    Default(DefaultFactory),
    /// Collect every field, then call the constructor.
    Args(Constructor),
    /// The type cannot be decoded.
    Unavailable,
}

/// Ordered field codecs of one object type plus its construction strategy.
pub struct ObjectMeta<F: CodecFormat> {
    info: TypeInfo,
    fields: Vec<FieldCodec<F>>,
    index: HashMap<String, usize>,
    construction: Construction,
    open: bool,
    fail_on_unrecognised: bool,
}

impl<F: CodecFormat> ObjectMeta<F> {
    /// Introspect `info`, resolving every field codec through `core`.
    pub(crate) fn resolve(core: &CodecCore<F>, info: &TypeInfo) -> Result<Self> {
        let config = core.config();
        let root = info
            .object()
            .ok_or_else(|| Error::NoUsableConstructor(info.key().name().to_string()))?;

        if !root.is_constructible() {
            if config.fail_on_no_type_constructor() {
                return Err(Error::NoUsableConstructor(info.key().name().to_string()));
            }
            log::debug!(
                "[ObjectMeta::resolve] {} has no constructor, decoding it will fail",
                info.key().simple_name()
            );
        }
        let construction = match (root.default, root.construct) {
            (Some(default), _) => Construction::Default(default),
            (None, Some(construct)) => Construction::Args(construct),
            (None, None) => Construction::Unavailable,
        };

        let mut fields = Vec::new();
        let mut taken: HashSet<String> = HashSet::new();
        let mut path: Vec<ParentInfo> = Vec::new();
        let mut level = info.clone();
        let mut depth = 0;

        loop {
            let obj = level.object().ok_or_else(|| Error::TypeMismatch {
                expected: "object parent".to_string(),
                found: level.key().name().to_string(),
            })?;

            for field in &obj.fields {
                let name = config.field_naming().resolve(field.name, depth, &taken);
                let field_info = (field.type_info)();
                let codec = core.codec_for(&field_info)?;
                let missing = match field_info.shape() {
                    Shape::Optional(opt) => Some(opt.none),
                    _ => None,
                };
                taken.insert(name.clone());
                fields.push(FieldCodec {
                    name,
                    declaring: level.key(),
                    depth,
                    path: path.clone(),
                    field: field.clone(),
                    field_type: field_info.key(),
                    codec,
                    missing,
                });
            }

            let parent = match &obj.parent {
                Some(parent) => parent.clone(),
                None => break,
            };
            let next = (parent.type_info)();
            path.push(parent);
            level = next;
            depth += 1;
        }

        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        log::debug!(
            "[ObjectMeta::resolve] {} -> {} fields over {} levels",
            info.key().name(),
            fields.len(),
            depth + 1
        );

        Ok(Self {
            open: root.open,
            info: info.clone(),
            fields,
            index,
            construction,
            fail_on_unrecognised: config.fail_on_unrecognised_fields(),
        })
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn type_key(&self) -> TypeKey {
        self.info.key()
    }

    /// Whether the object type is open (non-final).
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Field codecs in encoding order.
    pub fn fields(&self) -> &[FieldCodec<F>] {
        &self.fields
    }

    pub fn construction(&self) -> Construction {
        self.construction
    }

    /// Position of an external field name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Handle a field name absent from the schema: an error when strict,
    /// otherwise the value is skipped.
    pub fn unrecognised(&self, name: &str) -> Result<()> {
        if self.fail_on_unrecognised {
            return Err(Error::UnrecognisedField {
                type_name: self.info.key().name().to_string(),
                field: name.to_string(),
            });
        }
        log::trace!(
            "[ObjectMeta::unrecognised] skipping '{}' on {}",
            name,
            self.info.key().name()
        );
        Ok(())
    }

    /// Start decoding one instance.
    pub fn accumulator(&self) -> Result<Accumulator<'_, F>> {
        let state = match self.construction {
            Construction::Default(default) => AccState::Instance(default()),
            Construction::Args(_) => AccState::Args((0..self.fields.len()).map(|_| None).collect()),
            Construction::Unavailable => {
                return Err(Error::NoUsableConstructor(
                    self.info.key().name().to_string(),
                ))
            }
        };
        Ok(Accumulator { meta: self, state })
    }

    /// Check that `value` is an instance of this object type.
    pub fn check_instance(&self, value: &dyn AnyValue) -> Result<()> {
        if crate::reflect::value_type_id(value) == self.info.key().id() {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: self.info.key().name().to_string(),
                found: value.value_type_name().to_string(),
            })
        }
    }
}

enum AccState {
    Instance(Box<dyn AnyValue>),
    Args(Vec<Option<Box<dyn AnyValue>>>),
}

/// Per-call decode state collecting field values into one instance.
pub struct Accumulator<'m, F: CodecFormat> {
    meta: &'m ObjectMeta<F>,
    state: AccState,
}

impl<'m, F: CodecFormat> Accumulator<'m, F> {
    /// Store the decoded value of field `index`.
    pub fn set(&mut self, index: usize, value: Box<dyn AnyValue>) -> Result<()> {
        let field = self.meta.fields.get(index).ok_or_else(|| {
            Error::malformed(format!("field index {} out of range", index))
        })?;
        match &mut self.state {
            AccState::Instance(instance) => field.set((**instance).as_any_mut(), value),
            AccState::Args(slots) => {
                slots[index] = Some(value);
                Ok(())
            }
        }
    }

    /// Decode field `index` from `input` and store it.
    pub fn decode_field(&mut self, core: &CodecCore<F>, index: usize, input: &mut F::In) -> Result<()> {
        let field = self.meta.fields.get(index).ok_or_else(|| {
            Error::malformed(format!("field index {} out of range", index))
        })?;
        let value = field.decode(core, input)?;
        self.set(index, value)
    }

    /// Build the instance.
    pub fn finish(self) -> Result<Box<dyn AnyValue>> {
        match self.state {
            AccState::Instance(instance) => Ok(instance),
            AccState::Args(slots) => {
                let construct = match self.meta.construction {
                    Construction::Args(construct) => construct,
                    _ => {
                        return Err(Error::NoUsableConstructor(
                            self.meta.info.key().name().to_string(),
                        ))
                    }
                };
                let mut args = FieldArgs::new();
                for (field, slot) in self.meta.fields.iter().zip(slots) {
                    let value = slot.or_else(|| field.missing.map(|none| none()));
                    args.push(field.declaring.name(), field.field.name, value);
                }
                construct(&mut args)
            }
        }
    }
}
