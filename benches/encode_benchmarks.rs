use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use minisnip::encode;
use minisnip::pixel::frame_to_rgba;
use wayland_client::protocol::wl_shm;

const SIZES: [(&str, u32, u32); 3] = [
    ("640x480", 640, 480),
    ("1920x1080", 1920, 1080),
    ("3840x2160", 3840, 2160),
];

fn generate_test_data(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 4).map(|i| (i % 251) as u8).collect()
}

fn benchmark_frame_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_to_rgba");

    for (name, width, height) in SIZES.iter() {
        let data = generate_test_data(*width, *height);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| {
                let img = frame_to_rgba(
                    data,
                    *width,
                    *height,
                    width * 4,
                    wl_shm::Format::Xrgb8888,
                    false,
                )
                .expect("Failed to convert frame");
                black_box(img);
            });
        });
    }

    group.finish();
}

fn benchmark_png_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encoding");

    for (name, width, height) in SIZES.iter() {
        let data = generate_test_data(*width, *height);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| {
                let png = encode::to_png(data, *width, *height).expect("Failed to encode PNG");
                black_box(png);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_frame_conversion, benchmark_png_encoding);
criterion_main!(benches);
