// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared model types and helpers for integration tests.

#![allow(dead_code)]

use polycodec::{
    AnyValue, ByteFormat, CodecConfig, CodecCore, CodecFormat, Dyn, JsonFormat, Reflect, Result,
    XmlFormat,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

// ============================================================================
// Hierarchy
// ============================================================================

#[derive(Reflect, Debug, Clone, PartialEq, Default)]
#[reflect(open, default)]
pub struct Animal {
    pub name: String,
    pub age: u8,
}

/// Final subtype with one extra field.
#[derive(Reflect, Debug, Clone, PartialEq, Default)]
pub struct Dog {
    #[reflect(parent)]
    pub base: Animal,
    pub breed: String,
}

/// Subtype whose own `name` shadows the inherited one.
#[derive(Reflect, Debug, Clone, PartialEq, Default)]
#[reflect(default)]
pub struct Cat {
    #[reflect(parent)]
    pub base: Animal,
    pub name: String,
    pub indoor: bool,
}

/// Unrelated type, used to check ancestry.
#[derive(Reflect, Debug, Clone, PartialEq, Default)]
pub struct Robot {
    pub serial: u32,
}

#[derive(Reflect, Debug)]
pub struct Pair {
    pub first: Dyn<Animal>,
    pub second: Dyn<Animal>,
}

pub fn dog(name: &str, breed: &str) -> Dog {
    Dog {
        base: Animal {
            name: name.to_string(),
            age: 3,
        },
        breed: breed.to_string(),
    }
}

pub fn dog_pair() -> Pair {
    Pair {
        first: Dyn::new(dog("rex", "lab")),
        second: Dyn::new(dog("max", "pug")),
    }
}

/// Config resolving every hierarchy type by its simple name.
pub fn hierarchy_config() -> polycodec::CodecConfigBuilder {
    CodecConfig::builder()
        .alias::<Animal>("Animal")
        .alias::<Dog>("Dog")
        .alias::<Cat>("Cat")
        .alias::<Robot>("Robot")
}

// ============================================================================
// Recursion
// ============================================================================

#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct Node {
    pub value: i32,
    pub next: Option<Box<Node>>,
}

impl Node {
    pub fn chain(len: usize) -> Option<Box<Node>> {
        (0..len).rev().fold(None, |next, i| {
            Some(Box::new(Node {
                value: i as i32,
                next,
            }))
        })
    }

    pub fn depth(&self) -> usize {
        1 + self.next.as_ref().map_or(0, |n| n.depth())
    }
}

#[derive(Reflect, Debug, Clone, PartialEq, Default)]
#[reflect(default)]
pub struct Tree {
    pub label: String,
    pub children: Vec<Tree>,
}

// ============================================================================
// Shapes
// ============================================================================

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Color {
    #[default]
    Red,
    Green,
    #[reflect(rename = "BLUE")]
    Blue,
}

/// One field per supported shape, with string map keys only so every format
/// can carry it.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct Everything {
    pub flag: bool,
    pub tiny: i8,
    pub small: i16,
    pub medium: i32,
    pub large: i64,
    pub byte: u8,
    pub word: u16,
    pub dword: u32,
    pub qword: u64,
    pub single: f32,
    pub double: f64,
    pub letter: char,
    pub text: String,
    pub color: Color,
    pub fixed: [u16; 3],
    pub list: Vec<String>,
    pub deque: VecDeque<i64>,
    pub ordered: BTreeSet<u32>,
    pub hashed: HashSet<i8>,
    pub by_name: BTreeMap<String, f64>,
    pub by_key: HashMap<String, Vec<u8>>,
    pub present: Option<u64>,
    pub absent: Option<String>,
    pub boxed: Box<i16>,
    pub shared: Arc<String>,
    pub nested: Vec<Option<Vec<u8>>>,
    pub colors: Vec<Color>,
}

impl Everything {
    pub fn sample() -> Self {
        let mut by_name = BTreeMap::new();
        by_name.insert("pi".to_string(), 3.25);
        by_name.insert("neg".to_string(), -0.5);
        let mut by_key = HashMap::new();
        by_key.insert("a".to_string(), vec![1, 2, 3]);
        by_key.insert("empty".to_string(), Vec::new());

        Self {
            flag: true,
            tiny: i8::MIN,
            small: -1234,
            medium: i32::MAX,
            large: i64::MIN,
            byte: 255,
            word: 65535,
            dword: 4_000_000_000,
            qword: u64::MAX,
            single: 1.5,
            double: -2.75e10,
            letter: 'é',
            text: "hello <world> & \"friends\"".to_string(),
            color: Color::Blue,
            fixed: [1, 2, 3],
            list: vec!["x".to_string(), String::new(), "z z".to_string()],
            deque: VecDeque::from(vec![-1, 0, 1]),
            ordered: [5, 1, 3].into_iter().collect(),
            hashed: [-3, 7].into_iter().collect(),
            by_name,
            by_key,
            present: Some(42),
            absent: None,
            boxed: Box::new(-7),
            shared: Arc::new("shared".to_string()),
            nested: vec![Some(vec![9]), None, Some(Vec::new())],
            colors: vec![Color::Red, Color::Green],
        }
    }

    /// Random values for every field (text kept printable for XML).
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        let word = |rng: &mut fastrand::Rng| -> String {
            (0..rng.usize(0..12)).map(|_| rng.alphanumeric()).collect()
        };
        let color = |rng: &mut fastrand::Rng| match rng.u8(0..3) {
            0 => Color::Red,
            1 => Color::Green,
            _ => Color::Blue,
        };
        Self {
            flag: rng.bool(),
            tiny: rng.i8(..),
            small: rng.i16(..),
            medium: rng.i32(..),
            large: rng.i64(..),
            byte: rng.u8(..),
            word: rng.u16(..),
            dword: rng.u32(..),
            qword: rng.u64(..),
            single: f32::from(rng.i16(..)) / 8.0,
            double: f64::from(rng.i32(..)) / 16.0,
            letter: rng.alphanumeric(),
            text: word(rng),
            color: color(rng),
            fixed: [rng.u16(..), rng.u16(..), rng.u16(..)],
            list: (0..rng.usize(0..5)).map(|_| word(rng)).collect(),
            deque: (0..rng.usize(0..5)).map(|_| rng.i64(..)).collect(),
            ordered: (0..rng.usize(0..5)).map(|_| rng.u32(..)).collect(),
            hashed: (0..rng.usize(0..5)).map(|_| rng.i8(..)).collect(),
            by_name: (0..rng.usize(0..4))
                .map(|_| (word(rng), f64::from(rng.i16(..))))
                .collect(),
            by_key: (0..rng.usize(0..4))
                .map(|_| (word(rng), (0..rng.usize(0..4)).map(|_| rng.u8(..)).collect()))
                .collect(),
            present: if rng.bool() { Some(rng.u64(..)) } else { None },
            absent: if rng.bool() { Some(word(rng)) } else { None },
            boxed: Box::new(rng.i16(..)),
            shared: Arc::new(word(rng)),
            nested: (0..rng.usize(0..4))
                .map(|_| {
                    if rng.bool() {
                        Some((0..rng.usize(0..3)).map(|_| rng.u8(..)).collect())
                    } else {
                        None
                    }
                })
                .collect(),
            colors: (0..rng.usize(0..4)).map(|_| color(rng)).collect(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn byte_core(config: CodecConfig) -> CodecCore<ByteFormat> {
    CodecCore::new(ByteFormat::new(), config)
}

pub fn json_core(config: CodecConfig) -> CodecCore<JsonFormat> {
    CodecCore::new(JsonFormat::new(), config)
}

pub fn xml_core(config: CodecConfig) -> CodecCore<XmlFormat> {
    CodecCore::new(XmlFormat::new(), config)
}

/// Encode then decode through the in-memory representation.
pub fn roundtrip<F, T>(core: &CodecCore<F>, value: &T) -> Result<T>
where
    F: CodecFormat,
    F::Out: Into<F::In>,
    T: Reflect + AnyValue,
{
    let encoded = core.encode(value)?;
    core.decode(encoded)
}

/// Encode then decode through text for the tree formats and bytes for the
/// binary format.
pub fn roundtrip_all<T>(config: impl Fn() -> CodecConfig, value: &T) -> [T; 3]
where
    T: Reflect + AnyValue,
{
    let bytes = byte_core(config());
    let encoded = bytes.encode_to_vec(value).unwrap();
    let from_bytes = bytes.decode_from_slice::<T>(&encoded).unwrap();

    let json = json_core(config());
    let text = json.encode_to_string(value).unwrap();
    let from_json = json.decode_from_str::<T>(&text).unwrap();

    let xml = xml_core(config());
    let doc = xml.encode_to_string(value).unwrap();
    let from_xml = xml.decode_from_str::<T>(&doc).unwrap();

    [from_bytes, from_json, from_xml]
}
