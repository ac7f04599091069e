//! # Command Codec Benchmark
//!
//! Run with: `cargo bench --package ege_core --bench codec_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ege_core::{CommandBuffer, FrameBuffer, StaticArena};

const RECTS: usize = 1000;

fn filled_buffer() -> CommandBuffer<16384> {
    let mut buf = CommandBuffer::new();
    buf.push_clear(0xFF00_0000);
    for i in 0..RECTS {
        let n = (i % 512) as i16;
        buf.push_rect((i % 4) as u8, 0xFF00_FF00, n, n, 8, 8);
    }
    buf
}

/// Benchmark: encode 1000 rects.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(RECTS as u64));

    group.bench_function("encode_1000_rects", |b| {
        let mut buf: CommandBuffer<16384> = CommandBuffer::new();
        b.iter(|| {
            buf.reset();
            for i in 0..RECTS {
                let n = (i % 512) as i16;
                buf.push_rect(0, black_box(0xFF00_FF00), n, n, 8, 8);
            }
            black_box(buf.len())
        });
    });

    let buf = filled_buffer();
    group.bench_function("decode_1000_rects", |b| {
        let mut frame: FrameBuffer<1024> = FrameBuffer::new();
        b.iter(|| black_box(buf.decode(&mut frame)));
    });

    group.finish();
}

/// Benchmark: per-frame scratch allocation.
fn bench_arena(c: &mut Criterion) {
    let mut backing = vec![0u8; 64 * 1024];
    let mut arena = StaticArena::new(&mut backing);

    c.bench_function("arena_1000_allocs_then_reset", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(arena.allocate(24, 8).unwrap());
            }
            arena.reset();
        });
    });
}

criterion_group!(benches, bench_encode, bench_arena);
criterion_main!(benches);
