// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON tree format over `serde_json::Value`.
//!
//! - objects become JSON objects keyed by external field names
//! - null is `null`
//! - a tagged value is `{"@type": name, "@value": value}`. Tags are only
//!   looked for where the declared type is open and tags are enabled; there,
//!   an object with exactly these two keys is always read as a tag. Anywhere
//!   else such an object is plain data.
//! - maps with `String` keys become objects, other maps become arrays of
//!   `{"key": .., "value": ..}` entries
//! - non-finite floats are written as `"NaN"`, `"Infinity"`, `"-Infinity"`

use super::{non_finite_name, CodecFormat};
use crate::codec::{Codec, CodecHandle, CollectionMeta, MapMeta, ObjectMeta};
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::reflect::{AnyValue, Reflect, Scalar, ScalarKind, TypeKey};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

const TYPE_KEY: &str = "@type";
const VALUE_KEY: &str = "@value";

/// JSON tree format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl JsonFormat {
    pub fn new() -> Self {
        Self
    }
}

fn kind_error(expected: &str, found: &Value) -> Error {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Error::malformed(format!("expected JSON {}, found {}", expected, found))
}

fn float_value(value: f64) -> Value {
    match non_finite_name(value) {
        Some(name) => Value::String(name.to_string()),
        None => Number::from_f64(value).map_or(Value::Null, Value::Number),
    }
}

fn read_float(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| kind_error("float", value)),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(kind_error("float", value)),
        },
        other => Err(kind_error("float", other)),
    }
}

fn read_int<T: TryFrom<i64> + TryFrom<u64>>(kind: ScalarKind, value: &Value) -> Result<T> {
    let out_of_range = || Error::malformed(format!("{} out of range for {}", value, kind.name()));
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                <T as TryFrom<u64>>::try_from(v).map_err(|_| out_of_range())
            } else if let Some(v) = n.as_i64() {
                <T as TryFrom<i64>>::try_from(v).map_err(|_| out_of_range())
            } else {
                Err(kind_error("integer", value))
            }
        }
        other => Err(kind_error("integer", other)),
    }
}

fn take_object(input: &mut Value) -> Result<Map<String, Value>> {
    match std::mem::take(input) {
        Value::Object(map) => Ok(map),
        other => Err(kind_error("object", &other)),
    }
}

fn take_array(input: &mut Value) -> Result<Vec<Value>> {
    match std::mem::take(input) {
        Value::Array(items) => Ok(items),
        other => Err(kind_error("array", &other)),
    }
}

impl CodecFormat for JsonFormat {
    type Out = Value;
    type In = Value;

    fn name(&self) -> &'static str {
        "json"
    }

    fn new_output(&self) -> Value {
        Value::Null
    }

    fn encode_null(&self, null: bool, out: &mut Value) -> Result<()> {
        if null {
            *out = Value::Null;
        }
        Ok(())
    }

    fn decode_null(&self, input: &mut Value) -> Result<bool> {
        Ok(input.is_null())
    }

    fn encode_scalar(&self, scalar: Scalar, out: &mut Value) -> Result<()> {
        *out = match scalar {
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::I8(v) => Value::from(v),
            Scalar::I16(v) => Value::from(v),
            Scalar::I32(v) => Value::from(v),
            Scalar::I64(v) => Value::from(v),
            Scalar::U8(v) => Value::from(v),
            Scalar::U16(v) => Value::from(v),
            Scalar::U32(v) => Value::from(v),
            Scalar::U64(v) => Value::from(v),
            Scalar::F32(v) => float_value(f64::from(v)),
            Scalar::F64(v) => float_value(v),
            Scalar::Char(c) => Value::String(c.to_string()),
            Scalar::String(s) => Value::String(s),
        };
        Ok(())
    }

    fn decode_scalar(&self, kind: ScalarKind, input: &mut Value) -> Result<Scalar> {
        let value = &*input;
        Ok(match kind {
            ScalarKind::Bool => Scalar::Bool(value.as_bool().ok_or_else(|| kind_error("boolean", value))?),
            ScalarKind::I8 => Scalar::I8(read_int(kind, value)?),
            ScalarKind::I16 => Scalar::I16(read_int(kind, value)?),
            ScalarKind::I32 => Scalar::I32(read_int(kind, value)?),
            ScalarKind::I64 => Scalar::I64(read_int(kind, value)?),
            ScalarKind::U8 => Scalar::U8(read_int(kind, value)?),
            ScalarKind::U16 => Scalar::U16(read_int(kind, value)?),
            ScalarKind::U32 => Scalar::U32(read_int(kind, value)?),
            ScalarKind::U64 => Scalar::U64(read_int(kind, value)?),
            ScalarKind::F32 => Scalar::F32(read_float(value)? as f32),
            ScalarKind::F64 => Scalar::F64(read_float(value)?),
            ScalarKind::Char => {
                let s = value.as_str().ok_or_else(|| kind_error("string", value))?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Scalar::Char(c),
                    _ => return Err(Error::malformed(format!("'{}' is not a single char", s))),
                }
            }
            ScalarKind::String => match std::mem::take(input) {
                Value::String(s) => Scalar::String(s),
                other => return Err(kind_error("string", &other)),
            },
        })
    }

    fn encode_dynamic(
        &self,
        tag: Option<&str>,
        out: &mut Value,
        body: &mut dyn FnMut(&mut Value) -> Result<()>,
    ) -> Result<()> {
        let name = match tag {
            Some(name) => name,
            None => return body(out),
        };
        let mut inner = Value::Null;
        body(&mut inner)?;
        let mut tagged = Map::with_capacity(2);
        tagged.insert(TYPE_KEY.to_string(), Value::String(name.to_string()));
        tagged.insert(VALUE_KEY.to_string(), inner);
        *out = Value::Object(tagged);
        Ok(())
    }

    /// Only called for open declared types: an object holding exactly `@type`
    /// and `@value` is taken as a tag, whatever fields the base type has.
    fn decode_dynamic(&self, input: &mut Value) -> Result<Option<String>> {
        let tagged = matches!(
            input,
            Value::Object(map) if map.len() == 2 && map.contains_key(TYPE_KEY) && map.contains_key(VALUE_KEY)
        );
        if !tagged {
            return Ok(None);
        }
        let mut map = take_object(input)?;
        let name = match map.remove(TYPE_KEY) {
            Some(Value::String(name)) => name,
            Some(other) => return Err(kind_error("string type tag", &other)),
            None => return Err(Error::malformed("missing type tag")),
        };
        *input = map.remove(VALUE_KEY).unwrap_or(Value::Null);
        Ok(Some(name))
    }

    fn object_codec(&self, meta: ObjectMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(ObjectCodec { meta }))
    }

    fn array_codec(&self, meta: CollectionMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(SequenceCodec { meta }))
    }

    fn collection_codec(&self, meta: CollectionMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(SequenceCodec { meta }))
    }

    fn map_codec(&self, meta: MapMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(MapCodec { meta }))
    }
}

struct ObjectCodec {
    meta: ObjectMeta<JsonFormat>,
}

impl Codec<JsonFormat> for ObjectCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn is_final(&self) -> bool {
        !self.meta.is_open()
    }

    fn encode(&self, core: &CodecCore<JsonFormat>, value: &dyn AnyValue, out: &mut Value) -> Result<()> {
        self.meta.check_instance(value)?;
        let mut map = Map::with_capacity(self.meta.fields().len());
        for field in self.meta.fields() {
            let mut child = Value::Null;
            field.encode(core, value, &mut child)?;
            map.insert(field.name().to_string(), child);
        }
        *out = Value::Object(map);
        Ok(())
    }

    fn decode(&self, core: &CodecCore<JsonFormat>, input: &mut Value) -> Result<Box<dyn AnyValue>> {
        let map = take_object(input)?;
        let mut acc = self.meta.accumulator()?;
        for (name, mut child) in map {
            match self.meta.field_index(&name) {
                Some(index) => acc.decode_field(core, index, &mut child)?,
                None => self.meta.unrecognised(&name)?,
            }
        }
        acc.finish()
    }
}

struct SequenceCodec {
    meta: CollectionMeta<JsonFormat>,
}

impl Codec<JsonFormat> for SequenceCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn encode(&self, core: &CodecCore<JsonFormat>, value: &dyn AnyValue, out: &mut Value) -> Result<()> {
        let items = self.meta.items(value)?;
        let mut array = Vec::with_capacity(items.len());
        for item in items {
            let mut child = Value::Null;
            self.meta.element().encode_with_check(core, item, &mut child)?;
            array.push(child);
        }
        *out = Value::Array(array);
        Ok(())
    }

    fn decode(&self, core: &CodecCore<JsonFormat>, input: &mut Value) -> Result<Box<dyn AnyValue>> {
        let items = take_array(input)?;
        let mut buffer = self.meta.buffer(Some(items.len()));
        for mut item in items {
            buffer.push(self.meta.decode_element(core, &mut item)?);
        }
        self.meta.finish(buffer)
    }
}

struct MapCodec {
    meta: MapMeta<JsonFormat>,
}

impl Codec<JsonFormat> for MapCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn encode(&self, core: &CodecCore<JsonFormat>, value: &dyn AnyValue, out: &mut Value) -> Result<()> {
        let entries = self.meta.entries(value)?;
        if self.meta.has_string_keys() {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                let mut child = Value::Null;
                self.meta.value_codec().encode_with_check(core, value, &mut child)?;
                map.insert(self.meta.string_key(key)?.to_string(), child);
            }
            *out = Value::Object(map);
            return Ok(());
        }

        let mut array = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let mut k = Value::Null;
            let mut v = Value::Null;
            self.meta.key_codec().encode_with_check(core, key, &mut k)?;
            self.meta.value_codec().encode_with_check(core, value, &mut v)?;
            let mut entry = Map::with_capacity(2);
            entry.insert("key".to_string(), k);
            entry.insert("value".to_string(), v);
            array.push(Value::Object(entry));
        }
        *out = Value::Array(array);
        Ok(())
    }

    fn decode(&self, core: &CodecCore<JsonFormat>, input: &mut Value) -> Result<Box<dyn AnyValue>> {
        if self.meta.has_string_keys() {
            let map = take_object(input)?;
            let mut buffer = self.meta.buffer(Some(map.len()));
            for (key, mut value) in map {
                let value = self.meta.value_codec().decode_with_check(core, &mut value)?;
                buffer.push((Box::new(key) as Box<dyn AnyValue>, value));
            }
            return self.meta.finish(buffer);
        }

        let entries = take_array(input)?;
        let mut buffer = self.meta.buffer(Some(entries.len()));
        for mut entry in entries {
            let mut entry = take_object(&mut entry)?;
            let mut k = entry
                .remove("key")
                .ok_or_else(|| Error::malformed("map entry without \"key\""))?;
            let mut v = entry
                .remove("value")
                .ok_or_else(|| Error::malformed("map entry without \"value\""))?;
            let key = self.meta.key_codec().decode_with_check(core, &mut k)?;
            let value = self.meta.value_codec().decode_with_check(core, &mut v)?;
            buffer.push((key, value));
        }
        self.meta.finish(buffer)
    }
}

impl CodecCore<JsonFormat> {
    /// Encode `value` to a compact JSON string.
    pub fn encode_to_string<T: Reflect + AnyValue>(&self, value: &T) -> Result<String> {
        let tree = self.encode(value)?;
        serde_json::to_string(&tree).map_err(|e| Error::malformed(e.to_string()))
    }

    /// Decode a `T` from JSON text.
    pub fn decode_from_str<T: Reflect + AnyValue>(&self, text: &str) -> Result<T> {
        let tree: Value =
            serde_json::from_str(text).map_err(|e| Error::malformed(format!("invalid JSON: {}", e)))?;
        self.decode(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    fn core() -> CodecCore<JsonFormat> {
        CodecCore::new(JsonFormat::new(), CodecConfig::default())
    }

    #[test]
    fn test_scalars() {
        let core = core();
        assert_eq!(core.encode(&-3i8).unwrap(), json!(-3));
        assert_eq!(core.encode(&u64::MAX).unwrap(), json!(u64::MAX));
        assert_eq!(core.decode::<u64>(json!(u64::MAX)).unwrap(), u64::MAX);
        assert_eq!(core.encode(&'z').unwrap(), json!("z"));
        assert!(core.decode::<u8>(json!(300)).is_err());
        assert!(core.decode::<i32>(json!("1")).is_err());
    }

    #[test]
    fn test_non_finite_floats() {
        let core = core();
        assert_eq!(core.encode(&f64::INFINITY).unwrap(), json!("Infinity"));
        assert!(core.decode::<f64>(json!("NaN")).unwrap().is_nan());
        assert_eq!(core.decode::<f32>(json!(2)).unwrap(), 2.0);
    }

    #[test]
    fn test_string_keyed_map_is_object() {
        let core = core();
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u8);
        map.insert("b".to_string(), 2u8);
        assert_eq!(core.encode(&map).unwrap(), json!({"a": 1, "b": 2}));
        assert_eq!(core.decode::<BTreeMap<String, u8>>(json!({"a": 1, "b": 2})).unwrap(), map);
    }

    #[test]
    fn test_other_maps_are_entry_arrays() {
        let core = core();
        let mut map = HashMap::new();
        map.insert(4u16, "four".to_string());
        let tree = core.encode(&map).unwrap();
        assert_eq!(tree, json!([{"key": 4, "value": "four"}]));
        assert_eq!(core.decode::<HashMap<u16, String>>(tree).unwrap(), map);
    }

    #[test]
    fn test_text_round_trip() {
        let core = core();
        let text = core.encode_to_string(&vec![Some(1u32), None]).unwrap();
        assert_eq!(text, "[1,null]");
        let back: Vec<Option<u32>> = core.decode_from_str(&text).unwrap();
        assert_eq!(back, vec![Some(1), None]);
        assert!(core.decode_from_str::<Vec<u32>>("[1,").is_err());
    }
}
