//! Resolved dissimilarity access for the BUILD and SWAP cores.
//!
//! A fit either evaluates the configured [`Loss`] between data columns, or
//! short-circuits the loss entirely with a precomputed pairwise structure
//! supplied through [`PairwiseDissimilarity`]. Either way, the cores only see
//! a [`CostModel`], which routes lookups through the per-fit cache.

use crate::cache::DistanceCache;
use crate::loss::Loss;
use ndarray::Array2;
use num_traits::AsPrimitive;
use std::marker::PhantomData;

/// Read access to a precomputed set of pairwise dissimilarities.
///
/// [`points`](PairwiseDissimilarity::points) doubles as the validity check:
/// it returns the number of points only when the underlying storage
/// describes every pair, and `None` otherwise (a non-square matrix, or a
/// condensed buffer of the wrong length). Values are assumed symmetric with
/// a zero diagonal.
pub trait PairwiseDissimilarity<N: Copy> {
	/// Number of points described, or `None` for incomplete storage
	fn points(&self) -> Option<usize>;
	/// Dissimilarity between points x and y
	fn diss(&self, x: usize, y: usize) -> N;
}

/// A full n-by-n `ndarray` matrix of pairwise dissimilarities
impl<N: Copy> PairwiseDissimilarity<N> for Array2<N> {
	#[inline]
	fn points(&self) -> Option<usize> {
		let (rows, cols) = self.dim();
		(rows == cols).then_some(rows)
	}
	#[inline]
	fn diss(&self, x: usize, y: usize) -> N {
		self[[x, y]]
	}
}

/// Pairwise dissimilarities in condensed form.
///
/// Stores d(x, y) for every pair x < y, ordered by x and then y, with the
/// diagonal omitted: segment x holds d(x, x+1), ..., d(x, n-1), so the
/// buffer has n·(n-1)/2 entries in total.
///
/// ## Example
/// ```
/// use banditpam::{CondensedMatrix, KMedoids, KMedoidsConfig};
/// let diss = CondensedMatrix { n: 4, data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0] };
/// let mut model = KMedoids::new(KMedoidsConfig { n_medoids: 2, ..Default::default() });
/// let summary = model.fit_precomputed(&diss).unwrap();
/// println!("Loss is {}", summary.loss);
/// ```
#[derive(Debug, Clone)]
pub struct CondensedMatrix<N> {
	/// Number of points
	pub n: usize,
	/// The n·(n-1)/2 pairwise values
	pub data: Vec<N>,
}

impl<N: Copy + num_traits::Zero> PairwiseDissimilarity<N> for CondensedMatrix<N> {
	#[inline]
	fn points(&self) -> Option<usize> {
		let pairs = self.n.saturating_sub(1) * self.n / 2;
		(self.data.len() == pairs).then_some(self.n)
	}
	#[inline]
	fn diss(&self, x: usize, y: usize) -> N {
		if x == y {
			return N::zero();
		}
		let (lo, hi) = if x < y { (x, y) } else { (y, x) };
		// segments 0..lo hold (n-1) + (n-2) + ... + (n-lo) values
		let segment = lo * self.n - lo * (lo + 1) / 2;
		self.data[segment + hi - lo - 1]
	}
}

/// Where cost values come from, resolved once at fit entry.
pub(crate) trait CostSource: Sync {
	fn n_points(&self) -> usize;
	fn compute(&self, i: usize, j: usize) -> f64;
}

/// Pointwise loss over the column-major data matrix (column i is point i).
pub(crate) struct ColumnSource<'a> {
	pub(crate) data: &'a Array2<f64>,
	pub(crate) loss: Loss,
}

impl CostSource for ColumnSource<'_> {
	#[inline]
	fn n_points(&self) -> usize {
		self.data.ncols()
	}
	#[inline]
	fn compute(&self, i: usize, j: usize) -> f64 {
		self.loss.between(self.data.column(i), self.data.column(j))
	}
}

/// Precomputed input; the loss function is never consulted. The point count
/// is validated by the caller and pinned here.
pub(crate) struct MatrixSource<'a, N, M> {
	mat: &'a M,
	n: usize,
	_n: PhantomData<fn() -> N>,
}

impl<'a, N, M> MatrixSource<'a, N, M> {
	pub(crate) fn new(mat: &'a M, n: usize) -> Self {
		MatrixSource {
			mat,
			n,
			_n: PhantomData,
		}
	}
}

impl<N, M> CostSource for MatrixSource<'_, N, M>
where
	N: Copy + AsPrimitive<f64>,
	M: PairwiseDissimilarity<N> + Sync,
{
	#[inline]
	fn n_points(&self) -> usize {
		self.n
	}
	#[inline]
	fn compute(&self, i: usize, j: usize) -> f64 {
		self.mat.diss(i, j).as_()
	}
}

/// Cost access wrapper owning the per-fit cache.
///
/// [`CostModel::cost`] consults the cache; [`CostModel::cost_uncached`] is
/// the bypass for sampled bandit batches, where reference indices are fresh
/// every round and memoization would only churn the map.
pub(crate) struct CostModel<S> {
	source: S,
	cache: DistanceCache,
	caching: bool,
}

impl<S: CostSource> CostModel<S> {
	pub(crate) fn new(source: S, caching: bool) -> Self {
		CostModel {
			source,
			cache: DistanceCache::new(),
			caching,
		}
	}

	#[inline]
	pub(crate) fn n_points(&self) -> usize {
		self.source.n_points()
	}

	/// Memoized dissimilarity between points i and j.
	#[inline]
	pub(crate) fn cost(&self, i: usize, j: usize) -> f64 {
		if !self.caching {
			return self.source.compute(i, j);
		}
		self.cache
			.get_or_compute(i, j, || self.source.compute(i, j))
	}

	/// Dissimilarity computed directly, skipping the cache.
	#[inline]
	pub(crate) fn cost_uncached(&self, i: usize, j: usize) -> f64 {
		self.source.compute(i, j)
	}
}
