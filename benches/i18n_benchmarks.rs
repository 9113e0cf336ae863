//! Localization Benchmarks
//!
//! Measures catalog decoding, lookups and interpolation.
//!
//! Run with: cargo bench --bench i18n_benchmarks

use armature_gettext::testing::MoBuilder;
use armature_l10n::*;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

fn catalog_bytes(entries: usize) -> Vec<u8> {
    let mut builder = MoBuilder::new().plural_forms("nplurals=2; plural=(n != 1);");
    for i in 0..entries {
        builder = builder.message(&format!("message-{}", i), &format!("Nachricht ${{name}} {}", i));
    }
    builder
        .plural("${n} file", "${n} files", &["${n} Datei", "${n} Dateien"])
        .build()
}

// ============================================================================
// Catalog Decoding
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for entries in [10, 1_000] {
        let bytes = catalog_bytes(entries);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(format!("mo/{}", entries), |b| {
            b.iter(|| MessageCatalog::from_bytes(black_box(&bytes)).unwrap())
        });
    }

    group.finish();
}

// ============================================================================
// Lookups
// ============================================================================

fn bench_translate(c: &mut Criterion) {
    let mut store = CatalogStore::new();
    store
        .insert(
            "de",
            DEFAULT_DOMAIN,
            MessageCatalog::from_bytes(&catalog_bytes(1_000)).unwrap(),
        )
        .unwrap();
    let de = Localizer::new("de_AT", Arc::new(store));

    let hit = TranslationString::new("message-500")
        .unwrap()
        .with_mapping(Mapping::new().with("name", "Ada"));
    let miss = TranslationString::new("missing").unwrap().with_default("Hello ${name}");
    let mapping = Mapping::new().with("n", 3);

    let mut group = c.benchmark_group("translate");
    group.bench_function("hit_with_fallback", |b| b.iter(|| de.translate(black_box(&hit))));
    group.bench_function("miss", |b| b.iter(|| de.translate(black_box(&miss))));
    group.bench_function("pluralize", |b| {
        b.iter(|| de.pluralize("${n} file", "${n} files", black_box(3), None, Some(&mapping)))
    });
    group.finish();
}

fn bench_interpolate(c: &mut Criterion) {
    let mapping = Mapping::new().with("user", "Ada").with("count", 3);

    let mut group = c.benchmark_group("interpolate");
    group.bench_function("no_markers", |b| {
        b.iter(|| interpolate(black_box("nothing to replace here"), Some(&mapping)))
    });
    group.bench_function("two_markers", |b| {
        b.iter(|| interpolate(black_box("${user} has ${count} items"), Some(&mapping)))
    });
    group.finish();
}

criterion_group!(benches, bench_decode, bench_translate, bench_interpolate);
criterion_main!(benches);
