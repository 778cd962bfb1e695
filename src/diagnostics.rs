//! Per-fit diagnostic records.
//!
//! The estimator owns one [`FitDiagnostics`] value, cleared at the start of
//! every fit. The cores record a dispersion summary per BUILD step and per
//! SWAP iteration, and the total loss after each accepted change. With
//! `verbosity > 0` the records are additionally written as a text profile.

use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Distribution summary of the per-arm dispersion estimates of one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SigmaSummary {
	/// Smallest dispersion over arms
	pub min: f64,
	/// 25th percentile
	pub q25: f64,
	/// Median
	pub median: f64,
	/// 75th percentile
	pub q75: f64,
	/// Largest dispersion over arms
	pub max: f64,
	/// Mean dispersion
	pub mean: f64,
}

impl SigmaSummary {
	pub(crate) fn from_values(values: &[f64]) -> Self {
		if values.is_empty() {
			return SigmaSummary::default();
		}
		let mut sorted = values.to_vec();
		sorted.sort_by(f64::total_cmp);
		SigmaSummary {
			min: sorted[0],
			q25: quantile(&sorted, 0.25),
			median: quantile(&sorted, 0.5),
			q75: quantile(&sorted, 0.75),
			max: sorted[sorted.len() - 1],
			mean: values.iter().sum::<f64>() / values.len() as f64,
		}
	}
}

impl fmt::Display for SigmaSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"min: {}, 25th: {}, median: {}, 75th: {}, max: {}, mean: {}",
			self.min, self.q25, self.median, self.q75, self.max, self.mean
		)
	}
}

/// Linear-interpolation quantile of an ascending slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
	let pos = q * (sorted.len() - 1) as f64;
	let lo = pos.floor() as usize;
	let hi = pos.ceil() as usize;
	if lo == hi {
		sorted[lo]
	} else {
		sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
	}
}

/// Diagnostic records collected during one fit.
#[derive(Debug, Clone, Default)]
pub struct FitDiagnostics {
	/// Dispersion summary per BUILD step
	pub sigma_build: Vec<SigmaSummary>,
	/// Dispersion summary per SWAP iteration
	pub sigma_swap: Vec<SigmaSummary>,
	/// Total loss after each BUILD insertion
	pub loss_build: Vec<f64>,
	/// Total loss after each accepted swap
	pub loss_swap: Vec<f64>,
}

impl FitDiagnostics {
	pub(crate) fn clear(&mut self) {
		*self = FitDiagnostics::default();
	}

	/// Write the end-of-fit profile.
	pub(crate) fn write_profile(
		&self,
		path: &Path,
		build: &[usize],
		finals: &[usize],
		steps: usize,
		loss: f64,
	) -> io::Result<()> {
		let mut w = BufWriter::new(File::create(path)?);
		writeln!(w, "build medoids: {}", join(build))?;
		writeln!(w, "final medoids: {}", join(finals))?;
		writeln!(w, "swap steps: {}", steps)?;
		writeln!(w, "final loss: {}", loss)?;
		for (i, s) in self.sigma_build.iter().enumerate() {
			writeln!(w, "build sigma {}: {}", i, s)?;
		}
		writeln!(w, "build loss trace: {}", join(&self.loss_build))?;
		for (i, s) in self.sigma_swap.iter().enumerate() {
			writeln!(w, "swap sigma {}: {}", i, s)?;
		}
		writeln!(w, "swap loss trace: {}", join(&self.loss_swap))?;
		w.flush()
	}
}

fn join<T: fmt::Display>(xs: &[T]) -> String {
	xs.iter()
		.map(|x| x.to_string())
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn summary_of_known_values() {
		let s = SigmaSummary::from_values(&[4.0, 1.0, 3.0, 2.0]);
		assert_eq!(s.min, 1.0);
		assert_eq!(s.q25, 1.75);
		assert_eq!(s.median, 2.5);
		assert_eq!(s.q75, 3.25);
		assert_eq!(s.max, 4.0);
		assert_eq!(s.mean, 2.5);
	}

	#[test]
	fn summary_of_empty_slice_is_zero() {
		assert_eq!(SigmaSummary::from_values(&[]), SigmaSummary::default());
	}

	#[test]
	fn display_names_all_quantiles() {
		let text = SigmaSummary::from_values(&[1.0, 2.0]).to_string();
		for field in ["min:", "25th:", "median:", "75th:", "max:", "mean:"] {
			assert!(text.contains(field), "missing {}", field);
		}
	}

	#[test]
	fn profile_is_written() {
		let dir = std::env::temp_dir().join("banditpam-profile-test");
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("profile.txt");
		let mut diag = FitDiagnostics::default();
		diag.loss_build = vec![10.0, 4.0];
		diag.sigma_build = vec![SigmaSummary::from_values(&[1.0, 2.0])];
		diag.write_profile(&path, &[0, 3], &[0, 4], 1, 4.0).unwrap();
		let text = std::fs::read_to_string(&path).unwrap();
		assert!(text.contains("build medoids: 0 3"));
		assert!(text.contains("final medoids: 0 4"));
		assert!(text.contains("swap steps: 1"));
		assert!(text.contains("build sigma 0: min: 1"));
	}
}
