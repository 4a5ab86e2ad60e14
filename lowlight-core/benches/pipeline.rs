//! Benchmarks for the enhancement pipeline
//!
//! Run with: cargo bench -p lowlight-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgb, RgbImage};
use lowlight_core::clahe::{clahe, GridShape};
use lowlight_core::{enhance_rgb, EnhanceParams};

/// Synthetic dark gradient with a little texture
fn generate_dark_plane(width: u32, height: u32) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x + y) / 16 % 48 + (x * 7 + y * 3) % 9) as u8))
        .collect()
}

fn bench_clahe(c: &mut Criterion) {
    let mut group = c.benchmark_group("clahe");

    for size in [256u32, 512, 1024, 2048].iter() {
        let (w, h) = (*size, *size);
        group.throughput(Throughput::Elements((w * h) as u64));

        let plane = generate_dark_plane(w, h);
        group.bench_with_input(
            BenchmarkId::new("clahe_8x8", format!("{}x{}", w, h)),
            &plane,
            |b, plane| {
                b.iter(|| clahe(black_box(plane), w, h, 1.5, GridShape::new(8, 8)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_enhance_rgb(c: &mut Criterion) {
    let mut group = c.benchmark_group("enhance_rgb");
    let params = EnhanceParams::default();

    for size in [256u32, 1024].iter() {
        let (w, h) = (*size, *size);
        group.throughput(Throughput::Elements((w * h) as u64));

        let img = RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x / 8 % 64) as u8, (y / 8 % 48) as u8, ((x + y) / 16 % 32) as u8])
        });
        group.bench_with_input(
            BenchmarkId::new("balanced", format!("{}x{}", w, h)),
            &img,
            |b, img| {
                b.iter(|| enhance_rgb(black_box(img), &params).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_clahe, bench_enhance_rgb);
criterion_main!(benches);
