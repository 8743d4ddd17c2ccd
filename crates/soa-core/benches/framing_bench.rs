//! Criterion benchmarks for the length-prefixed framing codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package soa-core --bench framing_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use soa_core::protocol::framing::{decode_frame, encode_frame, MAX_PAYLOAD_LEN};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");

    let login = b"AUTH_login a@b.com pw123".to_vec();
    let max = vec![b'x'; MAX_PAYLOAD_LEN];

    for (name, payload) in [("login_command", &login), ("max_payload", &max)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), payload, |b, p| {
            b.iter(|| encode_frame(black_box(p)).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");

    let login = encode_frame(b"AUTH_login a@b.com pw123").unwrap();
    let max = encode_frame(&vec![b'x'; MAX_PAYLOAD_LEN]).unwrap();

    for (name, frame) in [("login_command", &login), ("max_payload", &max)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), frame, |b, f| {
            b.iter(|| decode_frame(black_box(f)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
