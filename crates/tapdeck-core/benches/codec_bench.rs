//! Criterion benchmarks for the TapDeck text codec.
//!
//! Every classified touch update is encoded on the input thread, so encoding
//! must stay well below a single frame interval.
//!
//! Run with:
//! ```bash
//! cargo bench --package tapdeck-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tapdeck_core::protocol::codec::{decode_event, encode_event};
use tapdeck_core::protocol::messages::SemanticEvent;

fn events() -> [(&'static str, SemanticEvent); 4] {
    [
        ("KeyDown", SemanticEvent::KeyDown('s')),
        ("KeyUp", SemanticEvent::KeyUp('l')),
        ("Delta", SemanticEvent::Delta(-12.345_678)),
        ("AbsolutePosition", SemanticEvent::AbsolutePosition(0.618_034)),
    ]
}

/// Benchmarks `encode_event` for every event kind.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_event");
    for (name, event) in events() {
        group.bench_with_input(BenchmarkId::new("event", name), &event, |b, event| {
            b.iter(|| encode_event(black_box(event)))
        });
    }
    group.finish();
}

/// Benchmarks `decode_event` from pre-encoded bytes.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_event");
    for (name, event) in events() {
        let bytes = encode_event(&event);
        group.bench_with_input(BenchmarkId::new("event", name), &bytes, |b, bytes| {
            b.iter(|| decode_event(black_box(bytes)).expect("decode must succeed"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
