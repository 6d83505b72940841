use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diarisk::preprocessing::{ClipBounds, StandardScaler};
use diarisk::training::fit_candidates;
use ndarray::{Array1, Array2};

/// Deterministic two-cluster classification data
fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, j)| {
        let base = if i < n_rows / 2 { 0.0 } else { 4.0 };
        base + ((i * 13 + j * 7) % 29) as f64 / 29.0
    });
    let y = Array1::from_shape_fn(n_rows, |i| if i < n_rows / 2 { 0.0 } else { 1.0 });
    (x, y)
}

fn bench_candidate_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_bank");
    group.sample_size(10);

    for n_rows in [100, 300].iter() {
        let (x, y) = create_classification_data(*n_rows, 4);

        group.bench_with_input(BenchmarkId::new("fit_all", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let fitted = fit_candidates(black_box(&x), black_box(&y));
                black_box(fitted.len())
            })
        });
    }

    group.finish();
}

fn bench_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");

    for n_rows in [1000, 5000].iter() {
        let (x, _) = create_classification_data(*n_rows, 4);

        group.bench_with_input(BenchmarkId::new("clip_scale", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let bounds = ClipBounds::fit(black_box(&x)).unwrap();
                let clipped = bounds.transform(&x).unwrap();
                let mut scaler = StandardScaler::new();
                black_box(scaler.fit_transform(&clipped).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_candidate_bank, bench_preprocessing);
criterion_main!(benches);
