use crate::dissim::{CostModel, CostSource};
use rayon::prelude::*;

/// Numerical slack for loss-change comparisons
pub(crate) const PRECISION: f64 = 1e-3;

/// Medoid position and distance pair
#[derive(Debug, Copy, Clone)]
pub(crate) struct DistancePair {
	pub(crate) i: u32,
	pub(crate) d: f64,
}
impl DistancePair {
	pub(crate) fn new(i: u32, d: f64) -> Self {
		DistancePair { i, d }
	}
	/// No medoid seen yet: unset position, infinite distance
	pub(crate) fn undefined() -> Self {
		DistancePair {
			i: u32::MAX,
			d: f64::INFINITY,
		}
	}
}

/// Information kept for each point: nearest and second nearest medoid
#[derive(Debug, Copy, Clone)]
pub(crate) struct Rec {
	pub(crate) near: DistancePair,
	pub(crate) seco: DistancePair,
}
impl Rec {
	pub(crate) fn undefined() -> Self {
		Rec {
			near: DistancePair::undefined(),
			seco: DistancePair::undefined(),
		}
	}
}

/// Find the minimum (index and value); ties keep the first occurrence
#[inline]
pub(crate) fn find_min<'a, I>(a: &mut I) -> (usize, f64)
where
	I: Iterator<Item = &'a f64>,
{
	let mut a = a.enumerate();
	let (idx0, val0) = a.next().unwrap();
	let mut best: (usize, f64) = (idx0, *val0);
	for (ik, iv) in a {
		if *iv < best.1 {
			best = (ik, *iv);
		}
	}
	best
}

/// Recompute assignments and best/second-best distances exactly.
///
/// Scans medoid positions in order with a strict comparison, so assignment
/// ties go to the lowest position. Returns the total loss and the per-point
/// records.
pub(crate) fn assign_points<S: CostSource>(d: &CostModel<S>, med: &[usize]) -> (f64, Vec<Rec>) {
	let n = d.n_points();
	let mut data = vec![Rec::undefined(); n];
	data.par_iter_mut().enumerate().for_each(|(i, rec)| {
		for (m, &me) in med.iter().enumerate() {
			let dm = d.cost(i, me);
			if dm < rec.near.d {
				rec.seco = rec.near;
				rec.near = DistancePair::new(m as u32, dm);
			} else if dm < rec.seco.d {
				rec.seco = DistancePair::new(m as u32, dm);
			}
		}
	});
	// summed on one thread so the result does not depend on work splitting
	(total_loss(&data), data)
}

/// Total loss of the current assignment
#[inline]
pub(crate) fn total_loss(data: &[Rec]) -> f64 {
	data.iter().map(|rec| rec.near.d).sum()
}

/// Unbiased sample standard deviation (n-1 normalization)
pub(crate) fn sample_stddev(xs: &[f64]) -> f64 {
	let n = xs.len();
	if n < 2 {
		return 0.0;
	}
	let mean = xs.iter().sum::<f64>() / n as f64;
	let var = xs
		.iter()
		.map(|x| {
			let d = x - mean;
			d * d
		})
		.sum::<f64>()
		/ (n - 1) as f64;
	var.sqrt()
}

/// Debug helper function
pub(crate) fn debug_assert_assignment<S: CostSource>(
	_d: &CostModel<S>,
	_med: &[usize],
	_data: &[Rec],
) {
	#[cfg(feature = "assertions")]
	for o in 0.._d.n_points() {
		debug_assert!(
			_d.cost(o, _med[_data[o].near.i as usize]) == _data[o].near.d,
			"primary assignment inconsistent"
		);
		debug_assert!(
			_data[o].near.d <= _data[o].seco.d,
			"nearest is farther than second nearest"
		);
	}
}

/// test two arrays for equality, used in tests only
#[cfg(test)]
pub(crate) fn assert_array(result: &[usize], expect: &[usize], msg: &'static str) {
	assert!(
		result.len() == expect.len() && result.iter().zip(expect.iter()).all(|(a, b)| a == b),
		"{}: {:?} != {:?}",
		msg,
		result,
		expect
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dissim::{ColumnSource, CostModel};
	use crate::loss::Loss;
	use ndarray::arr2;

	#[test]
	fn assignment_orders_best_and_second() {
		// four points on a line, medoids at 0 and 3
		let data = arr2(&[[0.0, 1.0, 8.0, 9.0]]);
		let model = CostModel::new(
			ColumnSource {
				data: &data,
				loss: Loss::Manhattan,
			},
			true,
		);
		let (loss, recs) = assign_points(&model, &[0, 3]);
		assert_eq!(loss, 2.0);
		assert_eq!(recs[1].near.i, 0);
		assert_eq!(recs[1].near.d, 1.0);
		assert_eq!(recs[1].seco.i, 1);
		assert_eq!(recs[1].seco.d, 8.0);
		for rec in &recs {
			assert!(rec.near.d <= rec.seco.d);
		}
	}

	#[test]
	fn assignment_ties_go_to_lowest_position() {
		// identical medoid columns: every point ties, position 0 must win
		let data = arr2(&[[5.0, 5.0, 6.0]]);
		let model = CostModel::new(
			ColumnSource {
				data: &data,
				loss: Loss::Manhattan,
			},
			true,
		);
		let (_, recs) = assign_points(&model, &[0, 1]);
		assert_eq!(recs[2].near.i, 0);
		assert_eq!(recs[2].seco.i, 1);
	}

	#[test]
	fn stddev_of_known_samples() {
		assert_eq!(sample_stddev(&[2.0, 2.0, 2.0]), 0.0);
		assert_eq!(sample_stddev(&[1.0]), 0.0);
		// {1, 2, 3, 4}: variance 5/3
		assert!((sample_stddev(&[1.0, 2.0, 3.0, 4.0]) - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
	}

	#[test]
	fn find_min_keeps_first_tie() {
		let xs = vec![3.0, 1.0, 1.0, 2.0];
		assert_eq!(find_min(&mut xs.iter()), (1, 1.0));
	}
}
