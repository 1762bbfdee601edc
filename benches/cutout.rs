//! Benchmark cue-window mapping onto playlist timelines.
//!
//! A six-hour recording in 6s segments is roughly the longest session a
//! replay bucket keeps; the cutout is a linear scan, so windows near the
//! end are the worst case.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use livereplay::hls::parser::parse_timeline;
use livereplay::replay::{Segment, segment_cutout};
use std::fmt::Write;

fn timeline(count: usize) -> Vec<Segment> {
    (0..count)
        .map(|i| Segment::new(if i % 7 == 0 { 5.5 } else { 6.0 }))
        .collect()
}

fn playlist_text(count: usize) -> String {
    let mut body = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n");
    for i in 0..count {
        let _ = writeln!(body, "#EXTINF:6.000,\nseg{i}.ts");
    }
    body.push_str("#EXT-X-ENDLIST\n");
    body
}

fn bench_cutout(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_cutout");

    for count in [600usize, 3600] {
        let segments = timeline(count);
        let total: f64 = segments.iter().map(|s| s.duration_seconds).sum();

        group.bench_with_input(BenchmarkId::new("window_at_start", count), &segments, |b, s| {
            b.iter(|| segment_cutout(black_box(5.0), black_box(65.0), s))
        });
        group.bench_with_input(BenchmarkId::new("window_at_end", count), &segments, |b, s| {
            b.iter(|| segment_cutout(black_box(total - 90.0), black_box(total - 1.0), s))
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let body = playlist_text(3600);
    c.bench_function("parse_timeline_3600", |b| {
        b.iter(|| parse_timeline(black_box(&body)).unwrap())
    });
}

criterion_group!(benches, bench_cutout, bench_parse);
criterion_main!(benches);
