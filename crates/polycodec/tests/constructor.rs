// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Construction paths: default-then-assign, constructor arguments, and types
//! with no way to be built.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use polycodec::reflect::{FieldInfo, ObjectInfo, Shape};
use polycodec::{AnyValue, CodecConfig, Error, Reflect, TypeInfo};
use std::any::Any;

/// Encodable, never decodable.
#[derive(Debug)]
struct Receipt {
    total: u32,
}

fn receipt_total(owner: &dyn Any) -> Option<&dyn AnyValue> {
    owner.downcast_ref::<Receipt>().map(|r| &r.total as &dyn AnyValue)
}

impl Reflect for Receipt {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Shape::Object(ObjectInfo::new(vec![FieldInfo::new(
            "total",
            u32::type_info,
            receipt_total,
        )])))
    }
}

#[test]
fn test_no_constructor_fails_generation_by_default() {
    let core = json_core(CodecConfig::default());
    assert!(matches!(
        core.encode(&Receipt { total: 5 }),
        Err(Error::NoUsableConstructor(name)) if name.ends_with("Receipt")
    ));
    assert!(!core.is_cached::<Receipt>());
}

#[test]
fn test_no_constructor_fails_at_decode_when_lenient() {
    let config = || {
        CodecConfig::builder()
            .fail_on_no_type_constructor(false)
            .build()
            .unwrap()
    };
    let json = json_core(config());
    let text = json.encode_to_string(&Receipt { total: 5 }).unwrap();
    assert_eq!(text, r#"{"total":5}"#);
    assert!(matches!(
        json.decode_from_str::<Receipt>(&text),
        Err(Error::NoUsableConstructor(_))
    ));
    // The codec itself stays cached; only decoding is impossible.
    assert!(json.is_cached::<Receipt>());

    let bytes = byte_core(config());
    let encoded = bytes.encode_to_vec(&Receipt { total: 5 }).unwrap();
    assert_eq!(encoded, vec![5, 0, 0, 0]);
    assert!(matches!(
        bytes.decode_from_slice::<Receipt>(&encoded),
        Err(Error::NoUsableConstructor(_))
    ));
}

#[test]
fn test_constructor_reports_missing_field() {
    let core = json_core(CodecConfig::default());
    match core.decode_from_str::<Dog>(r#"{"breed":"lab","age":2}"#) {
        Err(Error::MissingField { type_name, field }) => {
            assert!(type_name.ends_with("Animal"));
            assert_eq!(field, "name");
        }
        other => panic!("unexpected: {:?}", other),
    }
    match core.decode_from_str::<Dog>(r#"{"name":"rex","age":2}"#) {
        Err(Error::MissingField { type_name, field }) => {
            assert!(type_name.ends_with("Dog"));
            assert_eq!(field, "breed");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_default_construction_keeps_defaults() {
    let core = json_core(CodecConfig::default());
    let animal = core.decode_from_str::<Animal>(r#"{"age":4}"#).unwrap();
    assert_eq!(
        animal,
        Animal {
            name: String::new(),
            age: 4
        }
    );

    let cat = core.decode_from_str::<Cat>(r#"{"_name":"base"}"#).unwrap();
    assert_eq!(cat.base.name, "base");
    assert_eq!(cat.name, "");
    assert!(!cat.indoor);
}

#[test]
fn test_optional_fields_default_to_none_in_constructor() {
    let core = xml_core(CodecConfig::default());
    let node = core.decode_from_str::<Node>("<value><value>3</value></value>").unwrap();
    assert_eq!(
        node,
        Node {
            value: 3,
            next: None
        }
    );
}
