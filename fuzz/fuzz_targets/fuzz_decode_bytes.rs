// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use polycodec::{ByteFormat, CodecConfig, CodecCore, Dyn, Reflect};
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Reflect, Default)]
#[reflect(open, default)]
struct Animal {
    name: String,
    age: u8,
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
    note: Option<String>,
    index: HashMap<u16, Vec<char>>,
    fixed: [f32; 2],
}

fn core() -> &'static CodecCore<ByteFormat> {
    static CORE: OnceLock<CodecCore<ByteFormat>> = OnceLock::new();
    CORE.get_or_init(|| {
        let config = CodecConfig::builder()
            .alias::<Dog>("Dog")
            .build()
            .unwrap_or_default();
        CodecCore::new(ByteFormat::new(), config)
    })
}

fuzz_target!(|data: &[u8]| {
    // Malformed input must surface as an error, never a panic or an
    // allocation sized by an untrusted count.
    let _ = core().decode_from_slice::<Target>(data);
});
