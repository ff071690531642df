use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use rust_qr_scan::decode::decode_rqrr;
use rust_qr_scan::{Extraction, VideoDimensions, Viewport, ViewportMapping, WindowConfig, extract};

fn frame_1080p() -> RgbaImage {
    RgbaImage::from_fn(1920, 1080, |x, y| {
        let v = ((x / 8 + y / 8) % 2 * 255) as u8;
        Rgba([v, v, v, 255])
    })
}

fn mapping() -> ViewportMapping {
    ViewportMapping::compute(
        Viewport::new(1280.0, 720.0),
        VideoDimensions::new(1920, 1080),
        &WindowConfig::default(),
    )
    .unwrap()
}

fn bench_extract_window(c: &mut Criterion) {
    let frame = frame_1080p();
    let mapping = mapping();
    c.bench_function("extract_window_1920x1080", |b| {
        b.iter(|| extract(black_box(&frame), black_box(&mapping), Extraction::CropToWindow))
    });
}

fn bench_extract_full_frame(c: &mut Criterion) {
    let frame = frame_1080p();
    let mapping = mapping();
    c.bench_function("extract_full_1920x1080", |b| {
        b.iter(|| extract(black_box(&frame), black_box(&mapping), Extraction::FullFrame))
    });
}

fn bench_decode_window_vs_frame(c: &mut Criterion) {
    let frame = frame_1080p();
    let mapping = mapping();
    let window = extract(&frame, &mapping, Extraction::CropToWindow).unwrap().image;
    c.bench_function("decode_rqrr_window", |b| b.iter(|| decode_rqrr(black_box(&window))));
    c.bench_function("decode_rqrr_full_frame", |b| b.iter(|| decode_rqrr(black_box(&frame))));
}

criterion_group!(
    benches,
    bench_extract_window,
    bench_extract_full_frame,
    bench_decode_window_vs_frame
);
criterion_main!(benches);
