// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pair Round Trip Example
//!
//! A `Pair` declares two `Animal` fields and holds two `Dog`s. With dynamic
//! type tags the runtime type survives the trip in every format.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example pair_roundtrip
//! RUST_LOG=debug cargo run --example pair_roundtrip
//! ```

use polycodec::{ByteFormat, CodecConfig, CodecCore, Dyn, JsonFormat, Reflect, Result};

#[derive(Reflect, Debug, Default)]
#[reflect(open, default)]
struct Animal {
    name: String,
}

#[derive(Reflect, Debug)]
struct Dog {
    #[reflect(parent)]
    base: Animal,
    breed: String,
}

#[derive(Reflect, Debug)]
struct Pair {
    first: Dyn<Animal>,
    second: Dyn<Animal>,
}

fn dog(name: &str, breed: &str) -> Dyn<Animal> {
    Dyn::new(Dog {
        base: Animal {
            name: name.to_string(),
        },
        breed: breed.to_string(),
    })
}

fn describe(label: &str, pair: &Pair) {
    for (slot, value) in [("first", &pair.first), ("second", &pair.second)] {
        match value.downcast_ref::<Dog>() {
            Some(d) => println!("  [{}] {}: Dog {} ({})", label, slot, d.base.name, d.breed),
            None => println!("  [{}] {}: {}", label, slot, value.runtime_type().name()),
        }
    }
}

fn config(tags: bool) -> Result<CodecConfig> {
    CodecConfig::builder()
        .alias::<Animal>("Animal")
        .alias::<Dog>("Dog")
        .dynamic_type_tags(tags)
        .build()
}

fn main() -> Result<()> {
    env_logger::init();

    let pair = Pair {
        first: dog("rex", "lab"),
        second: dog("max", "pug"),
    };

    println!("JSON with type tags:");
    let json = CodecCore::new(JsonFormat::new(), config(true)?);
    let text = json.encode_to_string(&pair)?;
    println!("  {}", text);
    describe("json", &json.decode_from_str::<Pair>(&text)?);

    println!("Bytes with type tags:");
    let bytes = CodecCore::new(ByteFormat::new(), config(true)?);
    let encoded = bytes.encode_to_vec(&pair)?;
    println!("  {} bytes", encoded.len());
    describe("bytes", &bytes.decode_from_slice::<Pair>(&encoded)?);

    println!("JSON without type tags (subtypes are written as their base):");
    let untagged = CodecCore::new(JsonFormat::new(), config(false)?);
    let text = untagged.encode_to_string(&pair)?;
    println!("  {}", text);
    describe("untagged", &untagged.decode_from_str::<Pair>(&text)?);

    let stats = json.stats();
    println!(
        "json core: {} codecs generated, {} lookups, {} hits",
        stats.generations, stats.lookups, stats.hits
    );
    Ok(())
}
