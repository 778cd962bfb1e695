//! Exact PAM: the O(kn²) ground truth the bandit search is measured against.
//!
//! Shares the loss, the cache, and the assignment bookkeeping with the
//! bandit core; only the candidate evaluation differs, scanning every
//! reference point instead of sampling.

use crate::diagnostics::FitDiagnostics;
use crate::dissim::{CostModel, CostSource};
use crate::util::*;
use rayon::prelude::*;

/// BUILD: each step inserts the point whose addition exactly minimizes the
/// total loss over all reference points.
pub(crate) fn build<S: CostSource>(
	d: &CostModel<S>,
	k: usize,
	diag: &mut FitDiagnostics,
) -> (f64, Vec<usize>, Vec<Rec>) {
	let n = d.n_points();
	let mut meds: Vec<usize> = Vec::with_capacity(k);
	let mut data = vec![Rec::undefined(); n];
	let mut loss = f64::INFINITY;
	for _ in 0..k {
		let first = meds.is_empty();
		let candidates: Vec<usize> = (0..n).filter(|i| !meds.contains(i)).collect();
		let recs: &[Rec] = &data;
		let totals: Vec<f64> = candidates
			.par_iter()
			.map(|&i| {
				(0..n)
					.map(|j| {
						let c = d.cost(i, j);
						if first {
							c
						} else {
							c.min(recs[j].near.d)
						}
					})
					.sum()
			})
			.collect();
		let (b, _) = find_min(&mut totals.iter());
		meds.push(candidates[b]);
		let (l, newdata) = assign_points(d, &meds);
		data = newdata;
		loss = l;
		debug_assert_assignment(d, &meds, &data);
		diag.loss_build.push(loss);
	}
	(loss, meds, data)
}

/// Find the best medoid replacement by candidate j, exactly.
///
/// One pass over the references: a reference that j would take over from its
/// current medoid contributes to a shared accumulator, valid for every
/// replacement position; a reference that stays contributes only to the
/// position of its own medoid, which may fall back to the second-nearest.
#[inline]
fn find_best_swap<S: CostSource>(
	d: &CostModel<S>,
	data: &[Rec],
	k: usize,
	j: usize,
) -> (f64, usize) {
	let mut ploss = vec![0.0; k];
	let mut acc = 0.0;
	for (o, reco) in data.iter().enumerate() {
		let djo = d.cost(j, o);
		if djo < reco.near.d {
			acc += djo - reco.near.d;
		} else {
			ploss[reco.near.i as usize] += djo.min(reco.seco.d) - reco.near.d;
		}
	}
	let (b, bloss) = find_min(&mut ploss.iter());
	(bloss + acc, b) // add the shared accumulator
}

/// SWAP: apply the single best improving replacement per iteration, until no
/// replacement decreases the loss by more than the precision slack or the
/// iteration limit is hit.
pub(crate) fn swap<S: CostSource>(
	d: &CostModel<S>,
	meds: &mut Vec<usize>,
	data: &mut Vec<Rec>,
	max_iter: usize,
	diag: &mut FitDiagnostics,
) -> (f64, usize, bool) {
	let n = d.n_points();
	let k = meds.len();
	let mut loss = total_loss(data);
	let mut steps = 0;
	let mut converged = false;
	while steps < max_iter {
		let candidates: Vec<usize> = (0..n).filter(|j| !meds.contains(j)).collect();
		let recs: &[Rec] = data;
		let evals: Vec<(f64, usize)> = candidates
			.par_iter()
			.map(|&j| find_best_swap(d, recs, k, j))
			.collect();
		let mut best = (0.0, k, usize::MAX);
		for (ci, &(change, p)) in evals.iter().enumerate() {
			if change < best.0 {
				best = (change, p, candidates[ci]);
			}
		}
		if best.0 >= -PRECISION {
			converged = true;
			break;
		}
		meds[best.1] = best.2;
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

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dissim::{ColumnSource, CondensedMatrix, MatrixSource, PairwiseDissimilarity};
	use crate::loss::Loss;
	use ndarray::Array2;

	#[test]
	fn build_simple() {
		let diss = CondensedMatrix {
			n: 5,
			data: vec![1.0, 2.0, 4.0, 7.0, 3.0, 5.0, 8.0, 6.0, 9.0, 1.0],
		};
		let d = CostModel::new(MatrixSource::new(&diss, diss.points().unwrap()), false);
		let mut diag = FitDiagnostics::default();
		let (loss, meds, data) = build(&d, 2, &mut diag);
		assert_eq!(loss, 4.0, "loss not as expected");
		assert_array(&meds, &[0, 3], "medoids not as expected");
		let assi: Vec<usize> = data.iter().map(|r| r.near.i as usize).collect();
		assert_array(&assi, &[0, 0, 0, 1, 1], "assignment not as expected");
	}

	#[test]
	fn swap_simple() {
		let diss = CondensedMatrix {
			n: 5,
			data: vec![1.0, 2.0, 4.0, 7.0, 3.0, 5.0, 8.0, 6.0, 9.0, 1.0],
		};
		let d = CostModel::new(MatrixSource::new(&diss, diss.points().unwrap()), false);
		let mut diag = FitDiagnostics::default();
		let mut meds = vec![0, 1];
		let (_, mut data) = assign_points(&d, &meds);
		let (loss, steps, converged) = swap(&d, &mut meds, &mut data, 10, &mut diag);
		assert!(converged, "no fixed point reached");
		assert_eq!(loss, 4.0, "loss not as expected");
		assert_eq!(steps, 1, "swaps not as expected");
		assert_array(&meds, &[0, 3], "medoids not as expected");
		let assi: Vec<usize> = data.iter().map(|r| r.near.i as usize).collect();
		assert_array(&assi, &[0, 0, 0, 1, 1], "assignment not as expected");
	}

	#[test]
	fn collinear_points_pick_segment_medoids() {
		// x = 0..9 on a line; the exact 3-medoid solution is {1, 4, 7}
		let data = Array2::from_shape_fn((1, 10), |(_, i)| i as f64);
		let d = CostModel::new(
			ColumnSource {
				data: &data,
				loss: Loss::Manhattan,
			},
			true,
		);
		let mut diag = FitDiagnostics::default();
		let (_, mut meds, mut data) = build(&d, 3, &mut diag);
		let (loss, _, converged) = swap(&d, &mut meds, &mut data, 100, &mut diag);
		assert!(converged);
		assert_eq!(loss, 8.0, "loss not as expected");
		meds.sort_unstable();
		assert_array(&meds, &[1, 4, 7], "medoids not as expected");
	}

	#[test]
	fn single_medoid_is_the_exact_minimizer() {
		// sums of distances: the point at x=3 minimizes the total
		let data = ndarray::arr2(&[[0.0, 1.0, 3.0, 7.0, 8.0]]);
		let d = CostModel::new(
			ColumnSource {
				data: &data,
				loss: Loss::Manhattan,
			},
			true,
		);
		let mut diag = FitDiagnostics::default();
		let (loss, mut meds, mut data) = build(&d, 1, &mut diag);
		let best: usize = 2;
		assert_eq!(meds[0], best);
		let (loss2, steps, converged) = swap(&d, &mut meds, &mut data, 10, &mut diag);
		assert!(converged);
		assert_eq!(steps, 0);
		assert_eq!(loss, loss2);
		assert_eq!(meds[0], best);
	}
}
