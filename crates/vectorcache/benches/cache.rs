use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use once_cell::sync::Lazy;
use vectorcache::{CacheManager, CachedMethod, CachedProperty, Cacheable, InstanceCache};

struct Frame {
    cache: InstanceCache,
    data: Vec<f64>,
}

impl Cacheable for Frame {
    fn instance_cache(&self) -> &InstanceCache {
        &self.cache
    }
}

fn total(frame: &Frame) -> f64 {
    frame.data.iter().sum()
}

fn window_mean(frame: &Frame, window: usize) -> f64 {
    frame.data.iter().take(window).sum::<f64>() / window as f64
}

static TOTAL: Lazy<CachedProperty<Frame, f64>> = Lazy::new(|| CachedProperty::new("total", total));
static WINDOW_MEAN: Lazy<CachedMethod<Frame, usize, f64>> =
    Lazy::new(|| CachedMethod::new("window_mean", window_mean));

fn frame(manager: &Arc<CacheManager>) -> Frame {
    Frame {
        cache: InstanceCache::new(Arc::clone(manager)),
        data: (0..10_000).map(|i| i as f64).collect(),
    }
}

fn bench_property(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_property");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_cached", |b| {
        let manager = Arc::new(CacheManager::default());
        let frame = frame(&manager);
        TOTAL.get(&frame);

        b.iter(|| black_box(TOTAL.get(&frame)));
    });

    group.bench_function("get_bypassed", |b| {
        let manager = Arc::new(CacheManager::default());
        let frame = frame(&manager);
        let _off = manager.scoped(false);

        b.iter(|| black_box(TOTAL.get(&frame)));
    });

    group.finish();
}

fn bench_method(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_method");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("call_cached", |b| {
        let manager = Arc::new(CacheManager::default());
        let frame = frame(&manager);
        for window in 1..=100 {
            WINDOW_MEAN.call(&frame, window);
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(WINDOW_MEAN.call(&frame, counter % 100 + 1));
            counter += 1;
        });
    });

    group.bench_function("call_evicting", |b| {
        let manager = Arc::new(CacheManager::default());
        let frame = frame(&manager);

        // More distinct windows than the default maxsize
        let mut counter = 0;
        b.iter(|| {
            black_box(WINDOW_MEAN.call(&frame, counter % 1000 + 1));
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_property, bench_method);
criterion_main!(benches);
