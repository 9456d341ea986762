//! Markup codec benchmark suite.
//!
//! Benchmarks decoding and encoding at different message sizes:
//! - Segment counts: 1, 16, 256
//! - Plain text, mixed inline markup, nested quotes
//!
//! Run with: cargo bench --bench markup_codec
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use chatlink::markup::builders::{a, at, img_sized, message, quote, strong, text};
use chatlink::markup::{Element, MarkupCodec, standard_registry};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const SEGMENT_COUNTS: &[usize] = &[1, 16, 256];

// ============================================================================
// Fixtures
// ============================================================================

fn plain(segments: usize) -> Vec<Element> {
    (0..segments)
        .map(|i| text(format!("line {i} with <angle> & ampersand ")))
        .collect()
}

fn mixed(segments: usize) -> Vec<Element> {
    (0..segments)
        .flat_map(|i| {
            [
                at(format!("user-{i}")),
                text(" look at "),
                a("https://example.com/?a=1&b=2", [strong([text("this")])]),
                img_sized(format!("https://cdn.example.com/{i}.png"), 640, 480),
            ]
        })
        .collect()
}

fn nested(depth: usize) -> Vec<Element> {
    let mut inner = vec![text("innermost")];
    for i in 0..depth {
        inner = vec![quote(format!("q{i}")), message(i % 2 == 0, inner)];
    }
    inner
}

// ============================================================================
// Benchmark: Decode
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let codec = MarkupCodec::new(standard_registry());

    let mut group = c.benchmark_group("decode");
    for &count in SEGMENT_COUNTS {
        for (name, elements) in [("plain", plain(count)), ("mixed", mixed(count))] {
            let source = codec.encode(&elements).expect("encode fixture");
            group.throughput(Throughput::Bytes(source.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, count), &source, |b, source| {
                b.iter(|| codec.decode(black_box(source)).expect("decode"));
            });
        }
    }

    let source = codec.encode(&nested(32)).expect("encode fixture");
    group.bench_function("nested/32", |b| {
        b.iter(|| codec.decode(black_box(&source)).expect("decode"));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Encode
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let codec = MarkupCodec::new(standard_registry());

    let mut group = c.benchmark_group("encode");
    for &count in SEGMENT_COUNTS {
        for (name, elements) in [("plain", plain(count)), ("mixed", mixed(count))] {
            group.bench_with_input(BenchmarkId::new(name, count), &elements, |b, elements| {
                b.iter(|| codec.encode(black_box(elements)).expect("encode"));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
