//! # Pipeline Hand-Off Benchmark
//!
//! Measures the cost of moving one frame through the buffer pool:
//! begin, record, submit, consume, decode, release.
//!
//! Run with: `cargo bench --package ege_core --bench pipeline_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ege_core::{FrameBuffer, RenderPipeline, SpscQueue};

/// Benchmark: raw queue push/pop on a single thread.
fn bench_queue_round_trip(c: &mut Criterion) {
    let mut queue: SpscQueue<u32, 1024> = SpscQueue::new();

    c.bench_function("spsc_queue_push_pop", |b| {
        b.iter(|| {
            let pushed = queue.push(black_box(7));
            black_box((pushed, queue.pop()))
        });
    });
}

/// Benchmark: one full frame cycle on a single thread.
fn bench_frame_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_cycle");

    for rects in [1usize, 16, 128] {
        group.throughput(Throughput::Elements(rects as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rects), &rects, |b, &rects| {
            let pipeline = RenderPipeline::<4096>::new();
            let mut producer = pipeline.producer().unwrap();
            let mut consumer = pipeline.consumer().unwrap();
            let mut frame: FrameBuffer<256> = FrameBuffer::new();

            b.iter(|| {
                let buf = producer.begin_frame().unwrap();
                buf.push_clear(0xFF00_0000);
                for i in 0..rects {
                    let n = i as i16;
                    buf.push_rect(0, 0xFFFF_FFFF, n, n, 4, 4);
                }
                producer.submit_frame();
                black_box(consumer.consume_and_decode(&mut frame))
            });
        });
    }

    group.finish();
}

/// Benchmark: frames per second through two threads.
fn bench_cross_thread(c: &mut Criterion) {
    const FRAMES: u32 = 10_000;

    c.bench_function("cross_thread_10k_frames", |b| {
        b.iter(|| {
            let pipeline = RenderPipeline::<1024>::new();
            let mut producer = pipeline.producer().unwrap();
            let mut consumer = pipeline.consumer().unwrap();

            std::thread::scope(|s| {
                s.spawn(move || {
                    let mut sent = 0;
                    while sent < FRAMES {
                        if let Some(buf) = producer.begin_frame() {
                            buf.push_clear(sent);
                            producer.submit_frame();
                            sent += 1;
                        }
                    }
                });
                s.spawn(move || {
                    let mut frame: FrameBuffer<4> = FrameBuffer::new();
                    let mut received = 0;
                    while received < FRAMES {
                        if consumer.consume_and_decode(&mut frame) {
                            received += 1;
                        }
                    }
                });
            });

            black_box(pipeline.stats())
        });
    });
}

criterion_group!(benches, bench_queue_round_trip, bench_frame_cycle, bench_cross_thread);
criterion_main!(benches);
