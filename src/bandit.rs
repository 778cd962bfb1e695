//! BanditPAM: adaptive-sampling BUILD and SWAP.
//!
//! Every "which point becomes the next medoid" and "which replacement
//! improves the medoid set" decision is a best-arm identification problem.
//! Per-reference cost changes are sampled in batches of [`BATCH_SIZE`] and
//! arms are eliminated once their confidence interval can no longer contain
//! the smallest mean. An arm whose sample count reaches the number of
//! reference points switches to its exact mean, so the search degenerates to
//! the exact scan on small data.

use crate::diagnostics::{FitDiagnostics, SigmaSummary};
use crate::dissim::{CostModel, CostSource};
use crate::util::*;
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

/// Number of reference points sampled per arm and round
pub(crate) const BATCH_SIZE: usize = 100;

/// Running estimate for one candidate arm
struct ArmState {
	mean: f64,
	t: usize,
	sigma: f64,
	exact: bool,
}

/// Adaptive search for the arm with the smallest mean contribution.
///
/// Each round draws one batch of reference indices without replacement,
/// shared by all surviving arms, and updates every arm's running mean from a
/// consistent snapshot. The half-width of arm a after T samples is
/// sigma(a) * sqrt(confidence * ln(n) / T); an arm is eliminated once its
/// lower bound exceeds the smallest upper bound. Survivors are settled on
/// their exact means, so the returned mean is always exact.
fn ucb_minimize<F, G>(
	n_refs: usize,
	n_arms: usize,
	sigma: &[f64],
	confidence: f64,
	rng: &mut impl Rng,
	batch_mean: F,
	exact_mean: G,
) -> (usize, f64)
where
	F: Fn(usize, &[usize]) -> f64 + Sync,
	G: Fn(usize) -> f64 + Sync,
{
	let batch = BATCH_SIZE.min(n_refs);
	let scale = confidence * (n_refs as f64).ln();
	let mut arms: Vec<ArmState> = sigma
		.iter()
		.map(|&s| ArmState {
			mean: 0.0,
			t: 0,
			sigma: s,
			exact: false,
		})
		.collect();
	let mut active: Vec<usize> = (0..n_arms).collect();
	while active.len() > 1 && active.iter().any(|&a| !arms[a].exact) {
		let refs = index::sample(rng, n_refs, batch).into_vec();
		let updates: Vec<(f64, usize, bool)> = active
			.par_iter()
			.map(|&a| {
				let st = &arms[a];
				if st.exact {
					(st.mean, st.t, true)
				} else if st.t + batch >= n_refs {
					// cheaper to finish the arm exactly than to keep sampling
					(exact_mean(a), n_refs, true)
				} else {
					let m = batch_mean(a, &refs);
					let t = st.t + batch;
					((st.mean * st.t as f64 + m * batch as f64) / t as f64, t, false)
				}
			})
			.collect();
		for (&a, (mean, t, exact)) in active.iter().zip(updates) {
			let st = &mut arms[a];
			st.mean = mean;
			st.t = t;
			st.exact = exact;
		}
		let width = |st: &ArmState| {
			if st.exact {
				0.0
			} else {
				st.sigma * (scale / st.t as f64).sqrt()
			}
		};
		let mut min_ucb = f64::INFINITY;
		for &a in &active {
			let ucb = arms[a].mean + width(&arms[a]);
			if ucb < min_ucb {
				min_ucb = ucb;
			}
		}
		active.retain(|&a| arms[a].mean - width(&arms[a]) < min_ucb + PRECISION);
	}
	// settle the survivors on exact means; ties keep the lowest arm
	let finals: Vec<f64> = active
		.par_iter()
		.map(|&a| {
			if arms[a].exact {
				arms[a].mean
			} else {
				exact_mean(a)
			}
		})
		.collect();
	let (w, mean) = find_min(&mut finals.iter());
	(active[w], mean)
}

/// BUILD: grow the medoid set greedily from empty to size k.
///
/// The contribution of candidate a for reference r is the decrease of r's
/// best distance if a were inserted; for the first medoid it is the plain
/// distance. Returns the loss, the medoids, and the point records.
pub(crate) fn build<S: CostSource>(
	d: &CostModel<S>,
	k: usize,
	confidence: f64,
	rng: &mut impl Rng,
	diag: &mut FitDiagnostics,
) -> (f64, Vec<usize>, Vec<Rec>) {
	let n = d.n_points();
	let batch = BATCH_SIZE.min(n);
	let mut meds: Vec<usize> = Vec::with_capacity(k);
	let mut data = vec![Rec::undefined(); n];
	let mut loss = f64::INFINITY;
	for step in 0..k {
		let absolute = meds.is_empty();
		let arms: Vec<usize> = (0..n).filter(|i| !meds.contains(i)).collect();
		let recs: &[Rec] = &data;
		let delta = |r: usize, c: f64| {
			if absolute {
				c
			} else {
				c.min(recs[r].near.d) - recs[r].near.d
			}
		};
		// one-shot dispersion estimate per arm, shared reference batch
		let refs = index::sample(rng, n, batch).into_vec();
		let sigma: Vec<f64> = arms
			.par_iter()
			.map(|&a| {
				let sample: Vec<f64> = refs
					.iter()
					.map(|&r| delta(r, d.cost_uncached(a, r)))
					.collect();
				sample_stddev(&sample)
			})
			.collect();
		diag.sigma_build.push(SigmaSummary::from_values(&sigma));
		let (best, _) = ucb_minimize(
			n,
			arms.len(),
			&sigma,
			confidence,
			rng,
			|ai, refs| {
				refs.iter()
					.map(|&r| delta(r, d.cost_uncached(arms[ai], r)))
					.sum::<f64>() / refs.len() as f64
			},
			|ai| {
				(0..n)
					.map(|r| delta(r, d.cost(arms[ai], r)))
					.sum::<f64>() / n as f64
			},
		);
		let chosen = arms[best];
		meds.push(chosen);
		let (l, newdata) = assign_points(d, &meds);
		data = newdata;
		loss = l;
		debug_assert_assignment(d, &meds, &data);
		diag.loss_build.push(loss);
		tracing::debug!(step, medoid = chosen, loss, "build step complete");
	}
	(loss, meds, data)
}

/// SWAP: replace one medoid at a time until no replacement helps.
///
/// Arms are (medoid position, candidate point) pairs. The contribution of
/// (p, c) for reference r is the change of r's best distance if the medoid
/// at position p were replaced by c. The winning arm's exact mean decides
/// whether a fixed point is reached. Returns the loss, the number of
/// accepted swaps, and whether a fixed point was reached within `max_iter`.
pub(crate) fn swap<S: CostSource>(
	d: &CostModel<S>,
	meds: &mut Vec<usize>,
	data: &mut Vec<Rec>,
	max_iter: usize,
	confidence: f64,
	rng: &mut impl Rng,
	diag: &mut FitDiagnostics,
) -> (f64, usize, bool) {
	let n = d.n_points();
	let k = meds.len();
	let batch = BATCH_SIZE.min(n);
	let mut loss = total_loss(data);
	let mut steps = 0;
	let mut converged = false;
	while steps < max_iter {
		let arms: Vec<(usize, usize)> = (0..n)
			.filter(|j| !meds.contains(j))
			.flat_map(|j| (0..k).map(move |p| (p, j)))
			.collect();
		if arms.is_empty() {
			converged = true;
			break;
		}
		let recs: &[Rec] = data;
		let delta = |p: usize, r: usize, c: f64| {
			let rec = &recs[r];
			let new = if rec.near.i as usize == p {
				c.min(rec.seco.d)
			} else {
				c.min(rec.near.d)
			};
			new - rec.near.d
		};
		let refs = index::sample(rng, n, batch).into_vec();
		let sigma: Vec<f64> = arms
			.par_iter()
			.map(|&(p, j)| {
				let sample: Vec<f64> = refs
					.iter()
					.map(|&r| delta(p, r, d.cost_uncached(j, r)))
					.collect();
				sample_stddev(&sample)
			})
			.collect();
		diag.sigma_swap.push(SigmaSummary::from_values(&sigma));
		let (best, mean) = ucb_minimize(
			n,
			arms.len(),
			&sigma,
			confidence,
			rng,
			|ai, refs| {
				let (p, j) = arms[ai];
				refs.iter()
					.map(|&r| delta(p, r, d.cost_uncached(j, r)))
					.sum::<f64>() / refs.len() as f64
			},
			|ai| {
				let (p, j) = arms[ai];
				(0..n)
					.map(|r| delta(p, r, d.cost(j, r)))
					.sum::<f64>() / n as f64
			},
		);
		if mean >= -PRECISION {
			converged = true;
			break;
		}
		let (p, j) = arms[best];
		meds[p] = j;
		let (l, newdata) = assign_points(d, meds);
		*data = newdata;
		loss = l;
		debug_assert_assignment(d, meds, data);
		steps += 1;
		diag.loss_swap.push(loss);
		tracing::debug!(step = steps, loss, "swap accepted");
	}
	(loss, steps, converged)
}
