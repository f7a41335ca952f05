//! Benchmarks for the per-frame read paths: cache hits and hit-testing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use glam::Vec2;
use video_globe::{MockSource, SegmentMap, SurfaceLayout, VideoCache, VideoId};

fn bench_cache_hit(c: &mut Criterion) {
    let source = MockSource::with_catalog(["a"]);
    let cache = VideoCache::new(source, 25);
    let id = VideoId::new("a");
    block_on(cache.get_or_create(&id)).expect("preload failed");

    c.bench_function("cache_hit", |b| {
        b.iter(|| block_on(cache.get_or_create(black_box(&id))))
    });
}

fn bench_touch(c: &mut Criterion) {
    let source = MockSource::with_catalog(["a"]);
    let cache = VideoCache::new(source, 25);
    let id = VideoId::new("a");
    block_on(cache.get_or_create(&id)).expect("preload failed");

    c.bench_function("touch", |b| b.iter(|| cache.touch(black_box(&id))));
}

fn bench_hit_test(c: &mut Criterion) {
    let ids: Vec<VideoId> = (0..25).map(|index| VideoId::new(format!("v{index}"))).collect();
    let map = SegmentMap::with_seed(&ids, SurfaceLayout::default(), 42);

    c.bench_function("resolve_uv", |b| {
        b.iter(|| map.resolve(black_box(Vec2::new(0.37, 0.52))))
    });
}

criterion_group!(benches, bench_cache_hit, bench_touch, bench_hit_test);
criterion_main!(benches);
