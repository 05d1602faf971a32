// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use polycodec::{CodecConfig, CodecCore, Dyn, JsonFormat, Reflect};
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Reflect, Default)]
#[reflect(open, default)]
struct Animal {
    name: String,
    age: u8,
}

#[derive(Reflect, Default)]
#[reflect(default)]
struct Cat {
    #[reflect(parent)]
    base: Animal,
    name: String,
}

#[derive(Reflect)]
struct Target {
    pets: Vec<Dyn<Animal>>,
    scores: BTreeMap<String, f64>,
    maybe: Option<Option<u64>>,
}

fn core() -> &'static CodecCore<JsonFormat> {
    static CORE: OnceLock<CodecCore<JsonFormat>> = OnceLock::new();
    CORE.get_or_init(|| {
        let config = CodecConfig::builder()
            .alias::<Cat>("Cat")
            .fail_on_unrecognised_fields(false)
            .build()
            .unwrap_or_default();
        CodecCore::new(JsonFormat::new(), config)
    })
}

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = core().decode_from_str::<Target>(text);
    }
});
