// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use polycodec::{CodecConfig, CodecCore, Dyn, Reflect, XmlFormat};
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Reflect, Default)]
#[reflect(open, default)]
struct Animal {
    name: String,
}

#[derive(Reflect)]
struct Dog {
    #[reflect(parent)]
    base: Animal,
    breed: String,
}

#[derive(Reflect)]
struct Target {
    pets: Vec<Dyn<Animal>>,
    labels: HashMap<String, char>,
    matrix: Vec<[i16; 3]>,
}

fn core() -> &'static CodecCore<XmlFormat> {
    static CORE: OnceLock<CodecCore<XmlFormat>> = OnceLock::new();
    CORE.get_or_init(|| {
        let config = CodecConfig::builder()
            .alias::<Dog>("Dog")
            .allow_prefix(module_path!())
            .build()
            .unwrap_or_default();
        CodecCore::new(XmlFormat::new(), config)
    })
}

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        let _ = core().decode_from_str::<Target>(xml);
    }
});
