use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vessel_detect::matching::get_mappings;
use vessel_detect::metrics::iou::{calculate_iou, calculate_iou_matrix};
use vessel_detect::metrics::score::calculate_map;
use vessel_detect::rle::rle_to_bbox;
use vessel_detect::targets::filter_masks;
use vessel_detect::types::{BoundingBox, MaskRecord, ORIGINAL_FRAME};

fn boxes(count: usize) -> Vec<BoundingBox> {
    (0..count)
        .map(|i| {
            let offset = (i as f64) * 2.0;
            BoundingBox::new(offset, offset, offset + 50.0, offset + 50.0)
        })
        .collect()
}

fn rectangle_mask(row: u32, col: u32, rows: u32, cols: u32) -> String {
    (col..col + cols)
        .map(|c| format!("{} {}", c * 768 + row + 1, rows))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_iou_calculation(c: &mut Criterion) {
    let bbox1 = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
    let bbox2 = BoundingBox::new(30.0, 30.0, 70.0, 70.0);

    c.bench_function("iou_single", |b| {
        b.iter(|| calculate_iou(black_box(&bbox1), black_box(&bbox2)));
    });
}

fn bench_iou_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("iou_matrix");

    for size in [10, 50, 100, 500].iter() {
        let gt = boxes(*size);
        let pr = boxes(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| calculate_iou_matrix(black_box(&gt), black_box(&pr)));
        });
    }
    group.finish();
}

fn bench_greedy_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_mappings");

    for size in [10, 50, 100, 500].iter() {
        let iou = calculate_iou_matrix(&boxes(*size), &boxes(*size)).zero_below(0.5);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| get_mappings(black_box(&iou)));
        });
    }
    group.finish();
}

fn bench_image_score(c: &mut Criterion) {
    let gt = boxes(100);
    let pr = boxes(120);
    let scores: Vec<f64> = (0..120).map(|i| 1.0 - i as f64 / 120.0).collect();

    c.bench_function("calculate_map_100x120", |b| {
        b.iter(|| calculate_map(black_box(&gt), black_box(&pr), black_box(&scores), 0.5));
    });
}

fn bench_rle_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("rle_to_bbox");

    for cols in [10, 100, 700].iter() {
        let rle = rectangle_mask(30, 20, 200, *cols);
        group.bench_with_input(BenchmarkId::from_parameter(cols), cols, |b, _| {
            b.iter(|| rle_to_bbox(black_box(&rle), ORIGINAL_FRAME));
        });
    }
    group.finish();
}

fn bench_filter_masks(c: &mut Criterion) {
    let records: Vec<MaskRecord> = (0..10_000u32)
        .map(|i| {
            let mask = rectangle_mask(i % 700, i % 600, 20, 8);
            MaskRecord::new(format!("{:06}.jpg", i / 3), Some(mask.as_str()))
        })
        .collect();

    c.bench_function("filter_masks_10k", |b| {
        b.iter(|| filter_masks(black_box(&records), true));
    });
}

criterion_group!(
    benches,
    bench_iou_calculation,
    bench_iou_matrix,
    bench_greedy_matching,
    bench_image_score,
    bench_rle_decode,
    bench_filter_masks
);
criterion_main!(benches);
