//! Benchmarks for the codec pipelines
//!
//! Measures session setup, bulk encode/decode throughput and the
//! resynchronization path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use aptx_rs::{CodecContext, Mode};

fn pcm_signal(blocks: usize) -> Vec<u8> {
    let mut state = 0x1234_5678u32;
    let mut out = Vec::with_capacity(blocks * 24);
    for _ in 0..blocks * 8 {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        let sample = (state >> 4) & 0xFF_FFFF;
        out.push(sample as u8);
        out.push((sample >> 8) as u8);
        out.push((sample >> 16) as u8);
    }
    out
}

fn benchmark_context_creation(c: &mut Criterion) {
    c.bench_function("context_creation", |b| {
        b.iter(|| {
            let _ctx = CodecContext::new(black_box(Mode::Standard));
        })
    });
}

fn benchmark_encode_bulk(c: &mut Criterion) {
    let input = pcm_signal(256);
    let mut output = vec![0u8; 256 * 4];

    c.bench_function("encode_256_blocks", |b| {
        b.iter(|| {
            let mut ctx = CodecContext::new(Mode::Standard);
            let mut written = 0;
            ctx.encode(black_box(&input), black_box(&mut output), &mut written);
            black_box(written);
        })
    });
}

fn benchmark_encode_bulk_hd(c: &mut Criterion) {
    let input = pcm_signal(256);
    let mut output = vec![0u8; 256 * 6];

    c.bench_function("encode_256_blocks_hd", |b| {
        b.iter(|| {
            let mut ctx = CodecContext::new(Mode::Hd);
            let mut written = 0;
            ctx.encode(black_box(&input), black_box(&mut output), &mut written);
            black_box(written);
        })
    });
}

fn benchmark_decode_bulk(c: &mut Criterion) {
    let input = pcm_signal(256);
    let mut encoded = vec![0u8; 256 * 4];
    let mut written = 0;
    let mut encoder = CodecContext::new(Mode::Standard);
    encoder.encode(&input, &mut encoded, &mut written);

    let mut pcm = vec![0u8; 256 * 24];

    c.bench_function("decode_256_blocks", |b| {
        b.iter(|| {
            let mut ctx = CodecContext::new(Mode::Standard);
            let mut written = 0;
            ctx.decode(black_box(&encoded), black_box(&mut pcm), &mut written);
            black_box(written);
        })
    });
}

fn benchmark_decode_sync_clean(c: &mut Criterion) {
    let input = pcm_signal(256);
    let mut encoded = vec![0u8; 256 * 4];
    let mut written = 0;
    let mut encoder = CodecContext::new(Mode::Standard);
    encoder.encode(&input, &mut encoded, &mut written);

    let mut pcm = vec![0u8; 256 * 24];

    c.bench_function("decode_sync_256_blocks", |b| {
        b.iter(|| {
            let mut ctx = CodecContext::new(Mode::Standard);
            let (mut written, mut synced, mut dropped) = (0, false, 0);
            ctx.decode_sync(
                black_box(&encoded),
                black_box(&mut pcm),
                &mut written,
                &mut synced,
                &mut dropped,
            );
            black_box((written, synced, dropped));
        })
    });
}

criterion_group!(
    benches,
    benchmark_context_creation,
    benchmark_encode_bulk,
    benchmark_encode_bulk_hd,
    benchmark_decode_bulk,
    benchmark_decode_sync_clean
);
criterion_main!(benches);
