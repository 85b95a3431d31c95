//! Evaluate benchmarks: the hot path.
//!
//! Measures: identifier-only criteria, full criteria sets, structured and
//! fallback entry search, tag presence, and trace overhead.

use itemmatch::prelude::*;

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test fixtures
// ═══════════════════════════════════════════════════════════════════════════════

fn criteria(yaml: &str) -> Criteria {
    let source: DataValue = serde_yaml::from_str(yaml).unwrap();
    Criteria::from_value(&source, Strictness::Strict).unwrap()
}

fn sword() -> Item {
    let data: DataValue = serde_yaml::from_str(
        r"
tag:
  level: 5
  display:
    Lore: [first line, second line, third line]
  Enchantments: [sharpness, unbreaking, mending]
PublicBukkitValues:
  Internal: '{ownerUUID=abc123, created=1700000000, flags=[a, b, c]}'
",
    )
    .unwrap();
    Item::new("DIAMOND_SWORD")
        .with_display_name("Excalibur")
        .with_numeric_tag(vec![7.9])
        .with_raw_data(data)
}

/// Nested data with `width` maps of `width` scalars each.
fn wide_item(width: usize) -> Item {
    let data = DataValue::map((0..width).map(|i| {
        (
            format!("group{i}"),
            DataValue::map((0..width).map(|j| (format!("key{j}"), DataValue::Int(j as i64)))),
        )
    }));
    Item::new("CHEST").with_raw_data(data)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scalar criteria (no flattening)
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn empty_criteria(bencher: divan::Bencher) {
    let c = Criteria::empty();
    let item = sword();
    bencher.bench_local(|| c.is_matching(&item));
}

#[divan::bench]
fn identifier_hit(bencher: divan::Bencher) {
    let c = criteria("material: diamond_*");
    let item = sword();
    bencher.bench_local(|| c.is_matching(&item));
}

#[divan::bench]
fn scalar_criteria(bencher: divan::Bencher) {
    let c = criteria("material: diamond_*\nname: \"*calibur\"\ncustom-model-data: 7");
    let item = sword();
    bencher.bench_local(|| c.evaluate(&item));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Nested-data criteria
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn entry_search_structured(bencher: divan::Bencher) {
    let c = criteria("nbt-value: tag.level=5");
    let item = sword();
    bencher.bench_local(|| c.is_matching(&item));
}

#[divan::bench]
fn entry_search_fallback(bencher: divan::Bencher) {
    let c = criteria("nbt-value: owner*=abc*");
    let item = sword();
    bencher.bench_local(|| c.is_matching(&item));
}

#[divan::bench(args = [4, 16, 64])]
fn entry_search_miss(bencher: divan::Bencher, width: usize) {
    let c = criteria("nbt-value: missing*=1");
    let item = wide_item(width);
    bencher.bench_local(|| c.is_matching(&item));
}

#[divan::bench]
fn nbt_tags(bencher: divan::Bencher) {
    let c = criteria("nbt-tags: [enchant, lore, owner]");
    let item = sword();
    bencher.bench_local(|| c.is_matching(&item));
}

#[divan::bench]
fn full_criteria(bencher: divan::Bencher) {
    let c = criteria(
        "material: diamond_*\nname: \"*calibur\"\ncustom-model-data: 7\nnbt-value:\n  tag.level: 5\n  owner*: abc*\nnbt-tags: [enchant]",
    );
    let item = sword();
    bencher.bench_local(|| c.evaluate(&item));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Trace overhead
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn trace_full_criteria(bencher: divan::Bencher) {
    let c = criteria(
        "material: diamond_*\nname: \"*calibur\"\ncustom-model-data: 7\nnbt-value: tag.level=5",
    );
    let item = sword();
    bencher.bench_local(|| c.trace(&item));
}
