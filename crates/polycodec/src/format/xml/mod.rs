// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XML tree format.
//!
//! A value is an element (the document root is `<value>`):
//! - primitives are the element text
//! - object fields are child elements named after the external field name
//! - collection and array elements are `<item>` children
//! - map entries are `<entry key="..">` children; only `String` keys are
//!   representable
//! - null is `null="true"`, a dynamic type tag is `type=".."`

mod node;

pub use node::XmlElement;

use super::{parse_scalar, scalar_text, CodecFormat};
use crate::codec::{Codec, CodecHandle, CollectionMeta, MapMeta, ObjectMeta};
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::reflect::{AnyValue, Reflect, Scalar, ScalarKind, TypeKey};
use std::sync::Arc;

const ROOT: &str = "value";
const ITEM: &str = "item";
const ENTRY: &str = "entry";
const KEY_ATTR: &str = "key";
const NULL_ATTR: &str = "null";
const TYPE_ATTR: &str = "type";

/// XML element-tree format.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl XmlFormat {
    pub fn new() -> Self {
        Self
    }
}

impl CodecFormat for XmlFormat {
    type Out = XmlElement;
    type In = XmlElement;

    fn name(&self) -> &'static str {
        "xml"
    }

    fn new_output(&self) -> XmlElement {
        XmlElement::new(ROOT)
    }

    fn encode_null(&self, null: bool, out: &mut XmlElement) -> Result<()> {
        if null {
            out.set_attr(NULL_ATTR, "true");
        }
        Ok(())
    }

    fn decode_null(&self, input: &mut XmlElement) -> Result<bool> {
        match input.attr(NULL_ATTR) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(Error::malformed(format!("invalid null marker '{}'", other))),
        }
    }

    fn encode_scalar(&self, scalar: Scalar, out: &mut XmlElement) -> Result<()> {
        match scalar {
            Scalar::String(s) => out.set_text(s),
            other => out.set_text(scalar_text(&other)),
        }
        Ok(())
    }

    fn decode_scalar(&self, kind: ScalarKind, input: &mut XmlElement) -> Result<Scalar> {
        if !input.children().is_empty() {
            return Err(Error::malformed(format!(
                "<{}> holds elements where a {} was expected",
                input.name(),
                kind.name()
            )));
        }
        match kind {
            ScalarKind::String => Ok(Scalar::String(input.take_text())),
            _ => parse_scalar(kind, input.text()),
        }
    }

    fn encode_dynamic(
        &self,
        tag: Option<&str>,
        out: &mut XmlElement,
        body: &mut dyn FnMut(&mut XmlElement) -> Result<()>,
    ) -> Result<()> {
        body(out)?;
        if let Some(name) = tag {
            out.set_attr(TYPE_ATTR, name);
        }
        Ok(())
    }

    fn decode_dynamic(&self, input: &mut XmlElement) -> Result<Option<String>> {
        Ok(input.take_attr(TYPE_ATTR))
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
        if !meta.has_string_keys() {
            return Err(Error::unsupported(
                "xml",
                format!(
                    "map keys of type {} cannot be written as attributes",
                    meta.key_type().name()
                ),
            ));
        }
        Ok(Arc::new(MapCodec { meta }))
    }
}

struct ObjectCodec {
    meta: ObjectMeta<XmlFormat>,
}

impl Codec<XmlFormat> for ObjectCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn is_final(&self) -> bool {
        !self.meta.is_open()
    }

    fn encode(&self, core: &CodecCore<XmlFormat>, value: &dyn AnyValue, out: &mut XmlElement) -> Result<()> {
        self.meta.check_instance(value)?;
        for field in self.meta.fields() {
            let mut child = XmlElement::new(field.name());
            field.encode(core, value, &mut child)?;
            out.push(child);
        }
        Ok(())
    }

    fn decode(&self, core: &CodecCore<XmlFormat>, input: &mut XmlElement) -> Result<Box<dyn AnyValue>> {
        let mut acc = self.meta.accumulator()?;
        for mut child in input.take_children() {
            match self.meta.field_index(child.name()) {
                Some(index) => acc.decode_field(core, index, &mut child)?,
                None => self.meta.unrecognised(child.name())?,
            }
        }
        acc.finish()
    }
}

struct SequenceCodec {
    meta: CollectionMeta<XmlFormat>,
}

impl Codec<XmlFormat> for SequenceCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn encode(&self, core: &CodecCore<XmlFormat>, value: &dyn AnyValue, out: &mut XmlElement) -> Result<()> {
        for item in self.meta.items(value)? {
            let mut child = XmlElement::new(ITEM);
            self.meta.element().encode_with_check(core, item, &mut child)?;
            out.push(child);
        }
        Ok(())
    }

    fn decode(&self, core: &CodecCore<XmlFormat>, input: &mut XmlElement) -> Result<Box<dyn AnyValue>> {
        let children = input.take_children();
        let mut buffer = self.meta.buffer(Some(children.len()));
        for mut child in children {
            if child.name() != ITEM {
                return Err(Error::malformed(format!(
                    "expected <{}>, found <{}>",
                    ITEM,
                    child.name()
                )));
            }
            buffer.push(self.meta.decode_element(core, &mut child)?);
        }
        self.meta.finish(buffer)
    }
}

struct MapCodec {
    meta: MapMeta<XmlFormat>,
}

impl Codec<XmlFormat> for MapCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn encode(&self, core: &CodecCore<XmlFormat>, value: &dyn AnyValue, out: &mut XmlElement) -> Result<()> {
        for (key, value) in self.meta.entries(value)? {
            let mut entry = XmlElement::new(ENTRY);
            self.meta.value_codec().encode_with_check(core, value, &mut entry)?;
            entry.set_attr(KEY_ATTR, self.meta.string_key(key)?);
            out.push(entry);
        }
        Ok(())
    }

    fn decode(&self, core: &CodecCore<XmlFormat>, input: &mut XmlElement) -> Result<Box<dyn AnyValue>> {
        let children = input.take_children();
        let mut buffer = self.meta.buffer(Some(children.len()));
        for mut entry in children {
            if entry.name() != ENTRY {
                return Err(Error::malformed(format!(
                    "expected <{}>, found <{}>",
                    ENTRY,
                    entry.name()
                )));
            }
            let key = entry
                .take_attr(KEY_ATTR)
                .ok_or_else(|| Error::malformed("map <entry> without key attribute"))?;
            let value = self.meta.value_codec().decode_with_check(core, &mut entry)?;
            buffer.push((Box::new(key) as Box<dyn AnyValue>, value));
        }
        self.meta.finish(buffer)
    }
}

impl CodecCore<XmlFormat> {
    /// Encode `value` to an XML document.
    pub fn encode_to_string<T: Reflect + AnyValue>(&self, value: &T) -> Result<String> {
        self.encode(value)?.to_xml_string()
    }

    /// Decode a `T` from an XML document.
    pub fn decode_from_str<T: Reflect + AnyValue>(&self, xml: &str) -> Result<T> {
        self.decode(XmlElement::parse(xml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use std::collections::{BTreeMap, HashMap};

    fn core() -> CodecCore<XmlFormat> {
        CodecCore::new(XmlFormat::new(), CodecConfig::default())
    }

    #[test]
    fn test_scalar_document() {
        let core = core();
        assert_eq!(core.encode_to_string(&42u32).unwrap(), "<value>42</value>");
        assert_eq!(core.decode_from_str::<u32>("<value> 42 </value>").unwrap(), 42);
        assert_eq!(core.encode_to_string(&String::new()).unwrap(), "<value/>");
        assert_eq!(core.decode_from_str::<String>("<value/>").unwrap(), "");
    }

    #[test]
    fn test_null_attribute() {
        let core = core();
        let text = core.encode_to_string(&None::<String>).unwrap();
        assert_eq!(text, "<value null=\"true\"/>");
        assert_eq!(core.decode_from_str::<Option<String>>(&text).unwrap(), None);
        assert_eq!(
            core.decode_from_str::<Option<String>>("<value>x</value>").unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_items() {
        let core = core();
        let text = core.encode_to_string(&vec![1i8, -1]).unwrap();
        assert_eq!(text, "<value><item>1</item><item>-1</item></value>");
        assert_eq!(core.decode_from_str::<Vec<i8>>(&text).unwrap(), vec![1, -1]);
        assert!(core.decode_from_str::<Vec<i8>>("<value><x>1</x></value>").is_err());
    }

    #[test]
    fn test_string_keyed_map() {
        let core = core();
        let mut map = BTreeMap::new();
        map.insert("a b".to_string(), 1.5f64);
        let text = core.encode_to_string(&map).unwrap();
        assert_eq!(text, "<value><entry key=\"a b\">1.5</entry></value>");
        assert_eq!(core.decode_from_str::<BTreeMap<String, f64>>(&text).unwrap(), map);
    }

    #[test]
    fn test_map_children_must_be_entries() {
        let core = core();
        let doc = "<value><entry key=\"a\">1</entry><item key=\"b\">2</item></value>";
        assert!(matches!(
            core.decode_from_str::<BTreeMap<String, u8>>(doc),
            Err(Error::MalformedRepresentation(msg)) if msg.contains("<item>")
        ));
        let doc = "<value><entry key=\"a\">1</entry></value>";
        assert_eq!(core.decode_from_str::<BTreeMap<String, u8>>(doc).unwrap().len(), 1);
    }

    #[test]
    fn test_control_characters_fail_to_encode() {
        let core = core();
        assert!(matches!(
            core.encode_to_string(&"line\u{1}".to_string()),
            Err(Error::UnsupportedShape { format: "xml", .. })
        ));
        let mut map = BTreeMap::new();
        map.insert("\u{8}".to_string(), 1u8);
        assert!(core.encode_to_string(&map).is_err());
        assert!(core.encode_to_string(&"tab\tand\nnewline".to_string()).is_ok());
    }

    #[test]
    fn test_non_string_keys_unsupported() {
        let core = core();
        let map: HashMap<u8, u8> = HashMap::new();
        assert!(matches!(
            core.encode(&map),
            Err(Error::UnsupportedShape { format: "xml", .. })
        ));
        assert!(!core.is_cached::<HashMap<u8, u8>>());
    }
}
