use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use eos_spectro_rs::spectro_pipeline::{
    AnalysisConfig, CpuRotator, FixedConfirmer, Heatmap, ImageRotator, ImageToNitratePipeline,
    RgbImage, analysis::locate_band,
};

/// Level spectrometer photograph scaled from a 160x201 layout.
fn generate_mock_image(scale: usize) -> RgbImage {
    let (width, height) = (160 * scale, 201 * scale);
    let (top, bottom) = (50 * scale, 150 * scale);
    RgbImage::from_fn(width, height, |row, col| {
        let unscaled = col / scale;
        match unscaled {
            50..=70 if row == top => [250, 120, 60],
            50..=70 if row == bottom => [250, 120, 200],
            50..=70 => [100, 120, 60],
            107..=127 => [60, 90, 30],
            _ => [40, 40, 40],
        }
    })
    .expect("valid mock image")
}

fn benchmark_measure_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure_by_size");
    let dir = tempfile::tempdir().expect("temp dir");

    for scale in [1, 4, 10] {
        let image = generate_mock_image(scale);
        let label = format!("{}x{}", image.width, image.height);

        group.bench_with_input(BenchmarkId::from_parameter(label), &image, |b, image| {
            let config = AnalysisConfig::builder()
                .record_path(dir.path().join("missing.csv"))
                .build();
            let pipeline = ImageToNitratePipeline::new(config);
            let confirmer = FixedConfirmer::accept_all();

            b.iter(|| {
                let _ = pipeline.measure_image(black_box(image.clone()), &confirmer);
            });
        });
    }

    group.finish();
}

fn benchmark_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    let image = generate_mock_image(4);

    group.bench_function("heatmap", |b| {
        b.iter(|| Heatmap::from_image(black_box(&image)));
    });

    let heatmap = Heatmap::from_image(&image);
    group.bench_function("locate_band", |b| {
        b.iter(|| locate_band(black_box(&heatmap), 0.25));
    });

    group.bench_function("rotate", |b| {
        let rotator = CpuRotator::new();
        b.iter(|| rotator.rotate(black_box(&image), 3.0));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_measure_sizes,
    benchmark_stages
);
criterion_main!(benches);
