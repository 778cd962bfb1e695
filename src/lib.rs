//! k-Medoids Clustering with the BanditPAM Algorithm
//!
//! For details on the implemented BanditPAM algorithm, please see:
//!
//! Mo Tiwari, Martin J. Zhang, James Mayclin, Sebastian Thrun, Chris Piech, Ilan Shomorony
//! **BanditPAM: Almost Linear Time k-Medoids Clustering via Multi-Armed Bandits**
//! Advances in Neural Information Processing Systems 33 (NeurIPS 2020)
//! <https://arxiv.org/abs/2006.06856>
//!
//! Each BUILD insertion and each SWAP decision is treated as a best-arm
//! identification problem: the expected change in total loss of a candidate
//! is estimated from sampled batches of reference points, and candidates are
//! eliminated as soon as their confidence interval rules them out. This
//! replaces the O(n²) scans of classical PAM with roughly O(n log n) distance
//! evaluations per step, while finding the same medoids with high
//! probability. The exact PAM procedure is available as the "naive"
//! algorithm for ground truth and for small data.
//!
//! If you use this in scientific work, please consider citing above article.
//!
//! ## Example
//!
//! Four points in two dimensions, one point per column:
//! ```
//! let data = ndarray::arr2(&[[0.0, 0.2, 5.0, 5.2], [0.0, 0.2, 5.0, 5.2]]);
//! let mut model = banditpam::KMedoids::new(banditpam::KMedoidsConfig {
//!     n_medoids: 2,
//!     ..Default::default()
//! });
//! let summary = model.fit(&data, "L2").unwrap();
//! println!("Loss is: {}", summary.loss);
//! ```
mod bandit;
mod cache;
mod diagnostics;
mod dissim;
mod errors;
mod estimator;
mod loss;
mod naive;
mod util;

pub use crate::diagnostics::{FitDiagnostics, SigmaSummary};
pub use crate::dissim::{CondensedMatrix, PairwiseDissimilarity};
pub use crate::errors::{KMedoidsError, Result};
pub use crate::estimator::{Algorithm, FitSummary, KMedoids, KMedoidsConfig};
pub use crate::loss::Loss;
