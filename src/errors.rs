use thiserror::Error;

/// Error type used by operations in this crate.
///
/// Configuration problems are detected before any distance is computed, so a
/// failed [`crate::KMedoids::fit`] leaves no partial result behind.
#[derive(Debug, Error)]
pub enum KMedoidsError {
	/// The configured algorithm name is not one of "BanditPAM" or "naive".
	#[error("unrecognized algorithm '{0}'")]
	InvalidAlgorithm(String),
	/// The requested loss name could not be resolved (see [`crate::Loss`]).
	#[error("unrecognized loss function '{0}'")]
	InvalidLoss(String),
	/// The dataset or the medoid count does not describe a solvable problem.
	#[error("invalid shape: {0}")]
	InvalidShape(String),
	/// Writing the diagnostic profile failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Convenient alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, KMedoidsError>;
