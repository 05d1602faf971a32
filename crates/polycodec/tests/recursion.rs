// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self- and mutually-recursive type graphs.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use polycodec::codec::same_codec;
use polycodec::{CodecConfig, Reflect};

#[derive(Reflect, Debug, Clone, PartialEq)]
struct Department {
    title: String,
    head: Option<Box<Employee>>,
}

#[derive(Reflect, Debug, Clone, PartialEq)]
struct Employee {
    name: String,
    department: Option<Box<Department>>,
    reports: Vec<Employee>,
}

fn org() -> Department {
    Department {
        title: "research".to_string(),
        head: Some(Box::new(Employee {
            name: "ada".to_string(),
            department: Some(Box::new(Department {
                title: "lab".to_string(),
                head: None,
            })),
            reports: vec![
                Employee {
                    name: "bob".to_string(),
                    department: None,
                    reports: Vec::new(),
                },
                Employee {
                    name: "eve".to_string(),
                    department: None,
                    reports: vec![Employee {
                        name: "zed".to_string(),
                        department: None,
                        reports: Vec::new(),
                    }],
                },
            ],
        })),
    }
}

#[test]
fn test_node_generation_terminates() {
    let core = json_core(CodecConfig::default());
    let codec = core.get_codec::<Node>().unwrap();
    assert!(core.is_cached::<Node>());
    assert!(core.is_cached::<Option<Box<Node>>>());
    // Node, i32, Option<Box<Node>>, Box<Node>
    assert_eq!(core.stats().generations, 4);

    let again = core.get_codec::<Node>().unwrap();
    assert!(same_codec(&codec, &again));
}

#[test]
fn test_deep_node_chain() {
    let head = *Node::chain(100).unwrap();
    assert_eq!(head.depth(), 100);
    for back in roundtrip_all(CodecConfig::default, &head) {
        assert_eq!(back.depth(), 100);
        assert_eq!(back, head);
    }
}

#[test]
fn test_single_node() {
    let node = Node {
        value: -5,
        next: None,
    };
    let json = json_core(CodecConfig::default());
    assert_eq!(json.encode_to_string(&node).unwrap(), r#"{"next":null,"value":-5}"#);
    // An absent optional field decodes as None.
    assert_eq!(json.decode_from_str::<Node>(r#"{"value":-5}"#).unwrap(), node);
}

#[test]
fn test_recursion_through_collection() {
    let tree = Tree {
        label: "root".to_string(),
        children: vec![
            Tree {
                label: "a".to_string(),
                children: vec![Tree::default()],
            },
            Tree {
                label: "b".to_string(),
                children: Vec::new(),
            },
        ],
    };
    for back in roundtrip_all(CodecConfig::default, &tree) {
        assert_eq!(back, tree);
    }
}

#[test]
fn test_mutual_recursion() {
    for back in roundtrip_all(CodecConfig::default, &org()) {
        assert_eq!(back, org());
    }

    // Entering the cycle from either side yields the same codecs.
    let core = byte_core(CodecConfig::default());
    let employee = core.get_codec::<Employee>().unwrap();
    assert!(core.is_cached::<Department>());
    let department = core.get_codec::<Department>().unwrap();
    assert!(same_codec(&employee, &core.get_codec::<Employee>().unwrap()));
    assert!(same_codec(&department, &core.get_codec::<Department>().unwrap()));
    assert_eq!(core.stats().failures, 0);
}
