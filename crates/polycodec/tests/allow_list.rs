// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allow-list enforcement: disallowed types are rejected before anything is
//! instantiated.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use polycodec::{CodecConfig, Dyn, Error, Reflect};
use std::sync::atomic::{AtomicUsize, Ordering};

static INTRUDERS_BUILT: AtomicUsize = AtomicUsize::new(0);

/// Descendant whose construction is observable.
#[derive(Reflect, Debug)]
#[reflect(default)]
struct Intruder {
    #[reflect(parent)]
    base: Animal,
    payload: String,
}

impl Default for Intruder {
    fn default() -> Self {
        INTRUDERS_BUILT.fetch_add(1, Ordering::SeqCst);
        Self {
            base: Animal::default(),
            payload: String::new(),
        }
    }
}

fn intruder_pair() -> Pair {
    Pair {
        first: Dyn::new(Intruder {
            base: Animal {
                name: "mallory".to_string(),
                age: 1,
            },
            payload: "rm -rf".to_string(),
        }),
        second: Dyn::new(dog("max", "pug")),
    }
}

fn restricted() -> CodecConfig {
    hierarchy_config()
        .alias::<Intruder>("Intruder")
        .allow_type::<Pair>()
        .allow_type::<Animal>()
        .allow_type::<Dog>()
        .build()
        .unwrap()
}

fn permissive() -> CodecConfig {
    hierarchy_config().alias::<Intruder>("Intruder").build().unwrap()
}

#[test]
fn test_disallowed_tag_never_instantiated() {
    let text = json_core(permissive()).encode_to_string(&intruder_pair()).unwrap();
    let before = INTRUDERS_BUILT.load(Ordering::SeqCst);

    let core = json_core(restricted());
    assert!(matches!(
        core.decode_from_str::<Pair>(&text),
        Err(Error::DisallowedType(name)) if name.ends_with("Intruder")
    ));
    assert_eq!(INTRUDERS_BUILT.load(Ordering::SeqCst), before);
    assert!(!core.is_cached::<Intruder>());
}

#[test]
fn test_disallowed_tag_in_bytes_and_xml() {
    let bytes = byte_core(permissive()).encode_to_vec(&intruder_pair()).unwrap();
    let doc = xml_core(permissive()).encode_to_string(&intruder_pair()).unwrap();
    let before = INTRUDERS_BUILT.load(Ordering::SeqCst);

    assert!(matches!(
        byte_core(restricted()).decode_from_slice::<Pair>(&bytes),
        Err(Error::DisallowedType(_))
    ));
    assert!(matches!(
        xml_core(restricted()).decode_from_str::<Pair>(&doc),
        Err(Error::DisallowedType(_))
    ));
    assert_eq!(INTRUDERS_BUILT.load(Ordering::SeqCst), before);
}

#[test]
fn test_allowed_types_still_decode() {
    let core = json_core(restricted());
    let text = core.encode_to_string(&dog_pair()).unwrap();
    let pair = core.decode_from_str::<Pair>(&text).unwrap();
    assert!(pair.first.is::<Dog>());
}

#[test]
fn test_disallowed_declared_type_fails_generation() {
    let core = json_core(restricted());
    assert!(matches!(core.get_codec::<Robot>(), Err(Error::DisallowedType(_))));
    assert!(matches!(
        core.encode(&vec![Robot { serial: 1 }]),
        Err(Error::DisallowedType(_))
    ));
    assert!(!core.is_cached::<Vec<Robot>>());

    // Engine-provided shapes need no entry.
    assert!(core.get_codec::<Vec<Option<String>>>().is_ok());
}

#[test]
fn test_prefix_allows_module() {
    let module = module_path!();
    let core = json_core(
        hierarchy_config()
            .alias::<Intruder>("Intruder")
            .allow_prefix(module)
            .build()
            .unwrap(),
    );
    // Everything in this test crate lives under its module path.
    assert!(core.get_codec::<Intruder>().is_ok());
    assert!(core.get_codec::<Pair>().is_ok());

    let core = json_core(
        CodecConfig::builder()
            .allow_prefix(format!("{}x", module))
            .build()
            .unwrap(),
    );
    assert!(matches!(core.get_codec::<Intruder>(), Err(Error::DisallowedType(_))));
}
