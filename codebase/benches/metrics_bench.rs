use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use yolo_codebase::metrics::average_precision::ap_per_class;
use yolo_codebase::metrics::boxes::match_predictions;
use yolo_codebase::utils::*;

use criterion::*;

fn random_boxes(count: usize, classes: usize) -> Array2F {
    let corners = Array2F::random((count, 2), Uniform::new(0.0, 600.0));
    let sizes = Array2F::random((count, 2), Uniform::new(8.0, 40.0));
    let conf = Array1F::random(count, Uniform::new(0.0, 1.0));
    let class = Array1F::random(count, Uniform::new(0.0, classes as f64)).mapv(f64::floor);

    Array2F::from_shape_fn((count, 6), |(i, j)| match j {
        0 | 1 => corners[[i, j]],
        2 | 3 => corners[[i, j - 2]] + sizes[[i, j - 2]],
        4 => conf[i],
        _ => class[i],
    })
}

fn criterion_benchmark(c: &mut Criterion) {
    let iouv: Vec<f64> = Array1F::linspace(0.5, 0.95, 10).to_vec();
    let detections = random_boxes(3000, 4);
    let truth = random_boxes(1000, 4);
    let labels = Array2F::from_shape_fn((1000, 5), |(i, j)| if j == 0 { truth[[i, 5]] } else { truth[[i, j - 1]] });

    c.bench_function("match 3000 detections to 1000 labels", |b| b.iter(|| {
        match_predictions(&detections.view(), &labels.view(), &iouv).unwrap()
    }));

    let tp = Array2::random((20_000, 10), Uniform::new(0.0, 1.0)).mapv(|o: f64| o > 0.4);
    let conf = Array1F::random(20_000, Uniform::new(0.0, 1.0));
    let pred_cls = Array1F::random(20_000, Uniform::new(0.0, 4.0)).mapv(f64::floor);
    let target_cls = Array1F::random(8_000, Uniform::new(0.0, 4.0)).mapv(f64::floor);

    c.bench_function("ap_per_class 20000 predictions", |b| b.iter(|| {
        ap_per_class(&tp.view(), &conf.view(), &pred_cls.view(), &target_cls.view()).unwrap()
    }));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
