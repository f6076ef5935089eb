//! Baseline classifier benchmark: fit and predict on dense standardized matrices.

use aact_features::config::EvalConfig;
use aact_features::model::{Classifier, LogisticRegression};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array1, Array2};

fn make_matrix(rows: usize, cols: usize) -> (Array2<f64>, Array1<u8>) {
    let x = Array2::from_shape_fn((rows, cols), |(i, j)| ((i * 31 + j * 7) % 97) as f64 / 97.0);
    let y = Array1::from_shape_fn(rows, |i| u8::from(x[[i, 0]] + x[[i, 1]] > 1.0));
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let (x, y) = make_matrix(5_000, 23);
    let config = EvalConfig::default();

    c.bench_function("logistic_fit_5000x23", |b| {
        b.iter(|| {
            let mut model = LogisticRegression::new(&config);
            black_box(model.fit(x.view(), y.view()).ok())
        })
    });
}

fn bench_predict_by_rows(c: &mut Criterion) {
    let (x, y) = make_matrix(2_000, 23);
    let mut model = LogisticRegression::new(&EvalConfig::default());
    if model.fit(x.view(), y.view()).is_err() {
        return;
    }

    let mut g = c.benchmark_group("logistic_predict_by_rows");
    for rows in [100, 1_000, 10_000] {
        let (batch, _) = make_matrix(rows, 23);
        g.bench_function(format!("rows_{}", rows).as_str(), |b| {
            b.iter(|| black_box(model.predict_proba(black_box(batch.view())).ok()))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_fit, bench_predict_by_rows);
criterion_main!(benches);
