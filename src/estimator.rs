use crate::diagnostics::FitDiagnostics;
use crate::dissim::{ColumnSource, CostModel, CostSource, MatrixSource, PairwiseDissimilarity};
use crate::errors::{KMedoidsError, Result};
use crate::loss::Loss;
use crate::{bandit, naive};
use ndarray::Array2;
use num_traits::AsPrimitive;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Medoid search strategy, resolved from [`KMedoidsConfig::algorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
	/// Adaptive-sampling PAM with confidence-bound arm elimination
	BanditPam,
	/// Exact O(kn²) BUILD and SWAP
	Naive,
}

impl FromStr for Algorithm {
	type Err = KMedoidsError;

	fn from_str(s: &str) -> std::result::Result<Self, KMedoidsError> {
		match s {
			"BanditPAM" => Ok(Algorithm::BanditPam),
			"naive" => Ok(Algorithm::Naive),
			other => Err(KMedoidsError::InvalidAlgorithm(other.to_string())),
		}
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Algorithm::BanditPam => write!(f, "BanditPAM"),
			Algorithm::Naive => write!(f, "naive"),
		}
	}
}

/// Configurable knobs for a fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMedoidsConfig {
	/// Number of medoids to identify
	pub n_medoids: usize,
	/// Search strategy, "BanditPAM" or "naive"
	pub algorithm: String,
	/// Maximum number of SWAP iterations
	pub max_iter: usize,
	/// Scales the confidence interval width during BUILD
	pub build_confidence: f64,
	/// Scales the confidence interval width during SWAP
	pub swap_confidence: f64,
	/// When greater than zero, a diagnostic profile is written to `log_path`
	pub verbosity: usize,
	/// Destination of the diagnostic profile
	pub log_path: PathBuf,
	/// Seed for the reference-sampling random source
	pub seed: u64,
	/// Whether exact cost computations are memoized across the fit
	pub use_cache: bool,
}

impl Default for KMedoidsConfig {
	fn default() -> Self {
		KMedoidsConfig {
			n_medoids: 5,
			algorithm: "BanditPAM".to_string(),
			max_iter: 1000,
			build_confidence: 1000.0,
			swap_confidence: 10000.0,
			verbosity: 0,
			log_path: PathBuf::from("KMedoidsLogfile"),
			seed: 42,
			use_cache: true,
		}
	}
}

/// Outcome of a fit.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FitSummary {
	/// Total loss at termination
	pub loss: f64,
	/// Number of accepted swaps
	pub steps: usize,
	/// False when SWAP stopped at the iteration limit before a fixed point
	pub converged: bool,
}

/// k-medoids estimator.
///
/// Holds the configuration and, after a successful fit, the medoid set at
/// the end of BUILD, the final medoid set, the per-point assignment, the
/// number of swap steps, and the diagnostic records. A second fit discards
/// all prior results.
///
/// ## Example
/// ```
/// let data = ndarray::arr2(&[[0.0, 0.2, 5.0, 5.2], [0.0, 0.2, 5.0, 5.2]]);
/// let mut model = banditpam::KMedoids::new(banditpam::KMedoidsConfig {
///     n_medoids: 2,
///     ..Default::default()
/// });
/// let summary = model.fit(&data, "L2").unwrap();
/// println!("Loss is: {}", summary.loss);
/// ```
#[derive(Debug, Default)]
pub struct KMedoids {
	config: KMedoidsConfig,
	medoids_build: Vec<usize>,
	medoids_final: Vec<usize>,
	labels: Vec<usize>,
	steps: usize,
	diagnostics: FitDiagnostics,
}

impl KMedoids {
	/// Create an estimator with the given configuration.
	pub fn new(config: KMedoidsConfig) -> Self {
		KMedoids {
			config,
			..KMedoids::default()
		}
	}

	/// Current configuration
	pub fn config(&self) -> &KMedoidsConfig {
		&self.config
	}

	/// Mutable access to the configuration, effective at the next fit
	pub fn config_mut(&mut self) -> &mut KMedoidsConfig {
		&mut self.config
	}

	/// Medoid indices at the end of the BUILD step of the last fit
	pub fn medoids_build(&self) -> &[usize] {
		&self.medoids_build
	}

	/// Medoid indices at the end of the SWAP step of the last fit
	pub fn medoids_final(&self) -> &[usize] {
		&self.medoids_final
	}

	/// Position in the medoid set each point is assigned to
	pub fn labels(&self) -> &[usize] {
		&self.labels
	}

	/// Number of swap steps of the last fit
	pub fn steps(&self) -> usize {
		self.steps
	}

	/// Diagnostic records of the last fit
	pub fn diagnostics(&self) -> &FitDiagnostics {
		&self.diagnostics
	}

	/// Find medoids for `data` under the named loss.
	///
	/// `data` is column-major: column i is point i, rows are features. The
	/// loss name is resolved as described on [`Loss`].
	///
	/// Returns [`KMedoidsError::InvalidAlgorithm`] for an unknown algorithm
	/// name, [`KMedoidsError::InvalidLoss`] for an unknown loss name, and
	/// [`KMedoidsError::InvalidShape`] when the dataset is empty or smaller
	/// than the number of medoids. Hitting the iteration limit is not an
	/// error; it is reported as `converged = false` on the summary.
	pub fn fit(&mut self, data: &Array2<f64>, loss: &str) -> Result<FitSummary> {
		let algorithm: Algorithm = self.config.algorithm.parse()?;
		let loss: Loss = loss.parse()?;
		self.check_shape(data.ncols())?;
		let caching = self.config.use_cache;
		self.run(ColumnSource { data, loss }, caching, algorithm)
	}

	/// Find medoids for a precomputed pairwise dissimilarity structure.
	///
	/// The loss function is short-circuited entirely; the structure must be
	/// symmetric with a zero diagonal. Accepts a full `ndarray::Array2` or a
	/// [`crate::CondensedMatrix`], over any numeric value type.
	pub fn fit_precomputed<N, M>(&mut self, diss: &M) -> Result<FitSummary>
	where
		N: Copy + AsPrimitive<f64>,
		M: PairwiseDissimilarity<N> + Sync,
	{
		let algorithm: Algorithm = self.config.algorithm.parse()?;
		let n = diss.points().ok_or_else(|| {
			KMedoidsError::InvalidShape(
				"dissimilarity input does not describe a complete pairing".to_string(),
			)
		})?;
		self.check_shape(n)?;
		// the lookup is already as cheap as the memo map would be
		self.run(MatrixSource::new(diss, n), false, algorithm)
	}

	fn check_shape(&self, n: usize) -> Result<()> {
		if n == 0 {
			return Err(KMedoidsError::InvalidShape(
				"dataset has no points".to_string(),
			));
		}
		if n > u32::MAX as usize {
			return Err(KMedoidsError::InvalidShape(format!(
				"dataset has {} points, more than supported",
				n
			)));
		}
		if self.config.n_medoids < 1 {
			return Err(KMedoidsError::InvalidShape(
				"n_medoids must be at least 1".to_string(),
			));
		}
		if self.config.n_medoids > n {
			return Err(KMedoidsError::InvalidShape(format!(
				"n_medoids = {} exceeds the {} available points",
				self.config.n_medoids, n
			)));
		}
		Ok(())
	}

	fn run<S: CostSource>(
		&mut self,
		source: S,
		caching: bool,
		algorithm: Algorithm,
	) -> Result<FitSummary> {
		// results of any previous fit are discarded from here on
		self.medoids_build.clear();
		self.medoids_final.clear();
		self.labels.clear();
		self.steps = 0;
		self.diagnostics.clear();

		let d = CostModel::new(source, caching);
		let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
		let k = self.config.n_medoids;
		let (build_loss, mut meds, mut data) = match algorithm {
			Algorithm::BanditPam => bandit::build(
				&d,
				k,
				self.config.build_confidence,
				&mut rng,
				&mut self.diagnostics,
			),
			Algorithm::Naive => naive::build(&d, k, &mut self.diagnostics),
		};
		self.medoids_build = meds.clone();
		tracing::debug!(%algorithm, loss = build_loss, "build phase complete");

		let (loss, steps, converged) = match algorithm {
			Algorithm::BanditPam => bandit::swap(
				&d,
				&mut meds,
				&mut data,
				self.config.max_iter,
				self.config.swap_confidence,
				&mut rng,
				&mut self.diagnostics,
			),
			Algorithm::Naive => {
				naive::swap(&d, &mut meds, &mut data, self.config.max_iter, &mut self.diagnostics)
			}
		};
		if !converged {
			tracing::warn!(
				max_iter = self.config.max_iter,
				"swap stopped at the iteration limit before reaching a fixed point"
			);
		}
		self.medoids_final = meds;
		self.labels = data.iter().map(|rec| rec.near.i as usize).collect();
		self.steps = steps;
		if self.config.verbosity > 0 {
			self.diagnostics.write_profile(
				&self.config.log_path,
				&self.medoids_build,
				&self.medoids_final,
				steps,
				loss,
			)?;
		}
		Ok(FitSummary {
			loss,
			steps,
			converged,
		})
	}
}
