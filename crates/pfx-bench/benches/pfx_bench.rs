//! Benchmarks for the slicer and for kernels through the tiled renderer.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::{Arc, RwLock};

use pfx_core::{slice_region, ColorBgra, Rect, Region, Surface};
use pfx_effects::{CloudsEffect, CloudsToken, GaussianBlurEffect, GaussianBlurToken};
use pfx_render::{Effect, RenderSettings, TiledRenderer};

const SIZE: i32 = 512;

fn source() -> Arc<Surface> {
    let surface = Surface::from_fn(SIZE, SIZE, |x, y| {
        ColorBgra::opaque((x & 0xff) as u8, (y & 0xff) as u8, ((x ^ y) & 0xff) as u8)
    })
    .expect("source surface");
    Arc::new(surface)
}

/// Benchmark slicing rectangle and ellipse selections.
fn bench_slicer(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice");
    let bounds = Rect::from_size(SIZE, SIZE);
    let rect = Region::from_rect(bounds);
    let ellipse = Region::ellipse(bounds);

    for slices in [1usize, 8, 64, 256] {
        group.bench_with_input(BenchmarkId::new("rect", slices), &slices, |b, &n| {
            b.iter(|| slice_region(black_box(&rect), n, bounds))
        });
        group.bench_with_input(BenchmarkId::new("ellipse", slices), &slices, |b, &n| {
            b.iter(|| slice_region(black_box(&ellipse), n, bounds))
        });
    }

    group.finish();
}

/// Renders `effect` with 1, 2 and 4 workers over the whole surface.
fn bench_tiled<E: Effect>(c: &mut Criterion, group_name: &str, effect: E, token: E::Token) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements((SIZE * SIZE) as u64));
    group.sample_size(20);

    let effect = Arc::new(effect);
    let src = source();
    let region = Region::from_rect(src.bounds());

    for workers in [1usize, 2, 4] {
        let dst = Arc::new(RwLock::new(Surface::new(SIZE, SIZE).expect("destination surface")));
        let settings = RenderSettings::default().with_workers(workers).with_tiles_per_worker(4);
        let mut renderer = TiledRenderer::new(effect.clone(), src.clone(), dst, &region, settings)
            .expect("renderer");

        group.bench_with_input(BenchmarkId::new("workers", workers), &token, |b, token| {
            b.iter(|| {
                renderer.start(token).expect("start");
                renderer.join().expect("join");
            })
        });
    }

    group.finish();
}

fn bench_gaussian(c: &mut Criterion) {
    bench_tiled(c, "gaussian_blur_r8", GaussianBlurEffect, GaussianBlurToken { radius: 8 });
}

fn bench_clouds(c: &mut Criterion) {
    bench_tiled(c, "clouds", CloudsEffect, CloudsToken::default());
}

criterion_group!(benches, bench_slicer, bench_gaussian, bench_clouds);
criterion_main!(benches);
