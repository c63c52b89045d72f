use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use detection::{
    Detection,
    overlay::render_overlay,
    processing::{ClassNames, LetterboxTransform, PostProcessor, PreProcessor},
};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::{Array, IxDyn};

const NUM_CANDIDATES: usize = 8400;
const NUM_CLASSES: usize = 3;

/// YOLO-style `[1, 4 + classes, candidates]` output where the first
/// `num_detections` candidates clear the threshold, spread over a grid.
fn create_mock_yolo_output(num_detections: usize) -> Array<f32, IxDyn> {
    let features = 4 + NUM_CLASSES;
    let mut data = vec![0.01f32; features * NUM_CANDIDATES];

    for i in 0..num_detections.min(NUM_CANDIDATES) {
        let cx = 40.0 + (i % 10) as f32 * 60.0;
        let cy = 40.0 + (i / 10 % 10) as f32 * 60.0;
        data[i] = cx;
        data[NUM_CANDIDATES + i] = cy;
        data[2 * NUM_CANDIDATES + i] = 40.0;
        data[3 * NUM_CANDIDATES + i] = 40.0;
        data[(4 + i % NUM_CLASSES) * NUM_CANDIDATES + i] = 0.9;
    }

    Array::from_shape_vec(IxDyn(&[1, features, NUM_CANDIDATES]), data).unwrap()
}

fn benchmark_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");

    let resolutions = [(640, 480), (1280, 720), (1920, 1080)];

    for (width, height) in resolutions.iter() {
        let image = RgbImage::from_pixel(*width, *height, Rgb([128, 128, 128]));
        let mut preprocessor = PreProcessor::default();

        group.bench_with_input(
            BenchmarkId::new("letterbox", format!("{}x{}", width, height)),
            &image,
            |b, image| {
                b.iter(|| preprocessor.preprocess(black_box(image)).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_postprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocessing");
    let post_processor = PostProcessor::new(0.25, 0.45, 100);
    let names = ClassNames::from_list(["healthy", "defective", "unknown"]);
    let transform = LetterboxTransform {
        orig_width: 1920,
        orig_height: 1080,
        scale: 1.0 / 3.0,
        offset_x: 0.0,
        offset_y: 140.0,
    };

    for num_detections in [0, 5, 20, 50].iter() {
        let output = create_mock_yolo_output(*num_detections);

        group.bench_with_input(
            BenchmarkId::new("parse_detections", num_detections),
            &output,
            |b, output| {
                b.iter(|| {
                    post_processor.parse_detections(
                        black_box(&output.view()),
                        black_box(&transform),
                        black_box(&names),
                    )
                });
            },
        );
    }

    group.finish();
}

fn benchmark_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay");

    let source = RgbaImage::from_pixel(1280, 720, Rgba([90, 140, 60, 255]));
    let detections: Vec<Detection> = (0..20)
        .map(|i| {
            let x = (i % 5) * 240 + 10;
            let y = (i / 5) * 170 + 10;
            Detection::new("healthy", 0.9, [x, y, x + 200, y + 150])
        })
        .collect();

    group.bench_function("render_20_boxes_1280x720", |b| {
        b.iter(|| render_overlay(black_box(&source), black_box(&detections)));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_preprocessing,
    benchmark_postprocessing,
    benchmark_overlay
);
criterion_main!(benches);
