// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unknown-field handling.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use polycodec::{CodecConfig, Error};

fn lenient() -> CodecConfig {
    hierarchy_config()
        .fail_on_unrecognised_fields(false)
        .build()
        .unwrap()
}

#[test]
fn test_strict_by_default() {
    assert!(CodecConfig::default().fail_on_unrecognised_fields());
}

#[test]
fn test_json_unknown_field() {
    let text = r#"{"name":"rex","age":2,"colour":{"deep":[1,2,3]}}"#;

    let strict = json_core(hierarchy_config().build().unwrap());
    match strict.decode_from_str::<Animal>(text) {
        Err(Error::UnrecognisedField { type_name, field }) => {
            assert_eq!(field, "colour");
            assert!(type_name.ends_with("Animal"));
        }
        other => panic!("unexpected: {:?}", other),
    }

    let animal = json_core(lenient()).decode_from_str::<Animal>(text).unwrap();
    assert_eq!(
        animal,
        Animal {
            name: "rex".to_string(),
            age: 2
        }
    );
}

#[test]
fn test_xml_unknown_field() {
    let doc = "<value><name>rex</name><colour><deep>1</deep></colour><age>2</age></value>";

    let strict = xml_core(hierarchy_config().build().unwrap());
    assert!(matches!(
        strict.decode_from_str::<Animal>(doc),
        Err(Error::UnrecognisedField { field, .. }) if field == "colour"
    ));

    let animal = xml_core(lenient()).decode_from_str::<Animal>(doc).unwrap();
    assert_eq!(animal.name, "rex");
    assert_eq!(animal.age, 2);
}

#[test]
fn test_unknown_field_inside_tagged_subtype() {
    let text = r#"{"first":{"@type":"Dog","@value":{"name":"a","age":1,"breed":"b","tail":true}},"second":{"name":"c","age":2}}"#;

    let strict = json_core(hierarchy_config().build().unwrap());
    assert!(matches!(
        strict.decode_from_str::<Pair>(text),
        Err(Error::UnrecognisedField { field, .. }) if field == "tail"
    ));

    let pair = json_core(lenient()).decode_from_str::<Pair>(text).unwrap();
    assert_eq!(pair.first.downcast_ref::<Dog>().unwrap().breed, "b");
}

#[test]
fn test_inherited_field_names_are_recognised() {
    // "_name" is the shadowed parent field of Cat, not an unknown one.
    let text = r#"{"name":"own","_name":"base","age":4,"indoor":false}"#;
    let core = json_core(hierarchy_config().build().unwrap());
    let cat = core.decode_from_str::<Cat>(text).unwrap();
    assert_eq!(cat.name, "own");
    assert_eq!(cat.base.name, "base");

    assert!(matches!(
        core.decode_from_str::<Dog>(r#"{"name":"a","_name":"b","age":1,"breed":"c"}"#),
        Err(Error::UnrecognisedField { field, .. }) if field == "_name"
    ));
}
