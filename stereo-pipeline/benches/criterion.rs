use criterion::{criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use stereo_pipeline::stereo::BlockMatching;

fn shifted_pair(shift: u32) -> (GrayImage, GrayImage) {
    let texture = |x: u32, y: u32| Luma([((x * 37 + y * 11) % 251) as u8]);
    (
        GrayImage::from_fn(320, 240, texture),
        GrayImage::from_fn(320, 240, |x, y| texture(x + shift, y)),
    )
}

fn block_matching(c: &mut Criterion) {
    let (left, right) = shifted_pair(12);
    let small = BlockMatching {
        num_disparities: 16,
        block_size: 5,
        min_disparity: 0,
    };
    c.bench_function("block_matching_16", |b| {
        b.iter(|| small.match_images(&left, &right))
    });
    let default = BlockMatching::default();
    c.bench_function("block_matching_64", |b| {
        b.iter(|| default.match_images(&left, &right))
    });
}

criterion_group!(
    name = stereo;
    config = Criterion::default().sample_size(10);
    targets = block_matching
);
criterion_main!(stereo);
