//! Caption segmentation throughput benchmark.
//!
//! Segmentation runs once per render over the whole transcript, so it
//! should stay negligible next to the encoding stages even for very
//! long narrations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use story_sync::{segment_words, SegmenterConfig, TimedWord};

fn make_words(count: usize) -> Vec<TimedWord> {
    let gaps = [0.0f32, 0.1, 1.4, 0.05, 2.2, 0.3];
    let mut words = Vec::with_capacity(count);
    let mut clock = 0.0f32;
    for i in 0..count {
        clock += gaps[i % gaps.len()];
        let end = clock + 0.25;
        words.push(TimedWord::new(format!("word{}", i), clock, end));
        clock = end;
    }
    words
}

fn bench_segment_words(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_words");
    let config = SegmenterConfig::default();

    for count in [100usize, 1_000, 10_000] {
        let words = make_words(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &words, |b, words| {
            b.iter(|| segment_words(black_box(words), &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_segment_words);
criterion_main!(benches);
