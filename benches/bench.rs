//! Note that benchmarks can easily be misleading.
//! On data this small the naive scan is competitive; the bandit pays off as
//! the number of points grows.

use banditpam::{KMedoids, KMedoidsConfig};
use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn gaussian_clusters(
	n_per: usize,
	centers: &[(f64, f64)],
	spread: f64,
	rng: &mut ChaCha8Rng,
) -> Array2<f64> {
	let normal = Normal::new(0.0, spread).unwrap();
	let mut data = Array2::zeros((2, n_per * centers.len()));
	for (c, &(x, y)) in centers.iter().enumerate() {
		for s in 0..n_per {
			let i = c * n_per + s;
			data[[0, i]] = x + normal.sample(rng);
			data[[1, i]] = y + normal.sample(rng);
		}
	}
	data
}

fn bench_fit(c: &mut Criterion) {
	let mut rng = ChaCha8Rng::seed_from_u64(42);
	let centers = [(0.0, 0.0), (10.0, 10.0), (0.0, 10.0), (10.0, 0.0)];
	let data = gaussian_clusters(250, &centers, 1.0, &mut rng);

	c.bench_function("banditpam_1k_2d_k4", |b| {
		b.iter(|| {
			let mut model = KMedoids::new(KMedoidsConfig {
				n_medoids: 4,
				..Default::default()
			});
			model.fit(&data, "L2").expect("bench run")
		});
	});

	c.bench_function("naive_1k_2d_k4", |b| {
		b.iter(|| {
			let mut model = KMedoids::new(KMedoidsConfig {
				n_medoids: 4,
				algorithm: "naive".to_string(),
				..Default::default()
			});
			model.fit(&data, "L2").expect("bench run")
		});
	});
}

criterion_group!(benches, bench_fit);
criterion_main!(benches);
