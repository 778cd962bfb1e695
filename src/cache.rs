use parking_lot::RwLock;
use std::collections::HashMap;

/// Number of independently locked map segments.
const STRIPES: usize = 64;

/// Memo table for pairwise dissimilarities, living for one fit.
///
/// Keys are normalized to the unordered pair `(min, max)` so symmetric
/// lookups share one entry. Reads take a shared lock on the stripe owning the
/// key; a write happens only on a miss. Both paths return the stored value,
/// so repeated lookups of a pair are bit-identical.
pub(crate) struct DistanceCache {
	stripes: Vec<RwLock<HashMap<(u32, u32), f64>>>,
}

impl DistanceCache {
	pub(crate) fn new() -> Self {
		DistanceCache {
			stripes: (0..STRIPES).map(|_| RwLock::new(HashMap::new())).collect(),
		}
	}

	#[inline]
	fn stripe(&self, key: (u32, u32)) -> &RwLock<HashMap<(u32, u32), f64>> {
		let h = (key.0 as usize).wrapping_mul(0x9e37_79b1) ^ key.1 as usize;
		&self.stripes[h % STRIPES]
	}

	/// Look up the pair, computing and storing on a miss.
	pub(crate) fn get_or_compute(
		&self,
		i: usize,
		j: usize,
		compute: impl FnOnce() -> f64,
	) -> f64 {
		let key = if i <= j {
			(i as u32, j as u32)
		} else {
			(j as u32, i as u32)
		};
		let stripe = self.stripe(key);
		if let Some(&v) = stripe.read().get(&key) {
			return v;
		}
		let v = compute();
		// another thread may have raced us here; keep the first insert
		*stripe.write().entry(key).or_insert(v)
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.stripes.iter().map(|s| s.read().len()).sum()
	}
}

#[cfg(test)]
mod tests {
	use super::DistanceCache;

	#[test]
	fn hit_returns_stored_value() {
		let cache = DistanceCache::new();
		assert_eq!(cache.get_or_compute(3, 7, || 1.25), 1.25);
		// the closure must not run again on a hit
		assert_eq!(cache.get_or_compute(3, 7, || unreachable!()), 1.25);
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn symmetric_lookups_share_one_entry() {
		let cache = DistanceCache::new();
		assert_eq!(cache.get_or_compute(9, 2, || 0.5), 0.5);
		assert_eq!(cache.get_or_compute(2, 9, || unreachable!()), 0.5);
		assert_eq!(cache.len(), 1);
	}
}
