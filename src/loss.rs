use crate::errors::KMedoidsError;
use ndarray::ArrayView1;
use std::fmt;
use std::str::FromStr;

/// Dissimilarity function applied between two data columns.
///
/// All variants are symmetric and non-negative. The loss is resolved once at
/// the start of a fit from its textual name:
///
/// * `"manhattan"` - sum of absolute coordinate differences
/// * `"cos"` - one minus the cosine similarity
/// * `"inf"` - maximum absolute coordinate difference
/// * `"L<p>"` or bare `"<p>"` - Minkowski norm of positive integer order p,
///   e.g. `"L2"`, `"L3"` or `"2"`, `"3"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
	/// Sum of absolute coordinate differences (same as `Lp(1)`)
	Manhattan,
	/// One minus the cosine similarity; a zero-norm column compares as
	/// maximally dissimilar (distance 1)
	Cosine,
	/// Maximum absolute coordinate difference
	LInf,
	/// Minkowski norm of positive integer order p
	Lp(u32),
}

impl Loss {
	/// Evaluate the loss between two feature columns of equal length.
	pub(crate) fn between(self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
		match self {
			Loss::Manhattan | Loss::Lp(1) => {
				a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
			}
			Loss::Cosine => {
				let (mut dot, mut na, mut nb) = (0.0, 0.0, 0.0);
				for (x, y) in a.iter().zip(b.iter()) {
					dot += x * y;
					na += x * x;
					nb += y * y;
				}
				if na == 0.0 || nb == 0.0 {
					return 1.0;
				}
				1.0 - dot / (na.sqrt() * nb.sqrt())
			}
			Loss::LInf => a
				.iter()
				.zip(b.iter())
				.map(|(x, y)| (x - y).abs())
				.fold(0.0, f64::max),
			Loss::Lp(2) => a
				.iter()
				.zip(b.iter())
				.map(|(x, y)| {
					let d = x - y;
					d * d
				})
				.sum::<f64>()
				.sqrt(),
			Loss::Lp(p) => a
				.iter()
				.zip(b.iter())
				.map(|(x, y)| (x - y).abs().powi(p as i32))
				.sum::<f64>()
				.powf(1.0 / p as f64),
		}
	}
}

impl FromStr for Loss {
	type Err = KMedoidsError;

	fn from_str(s: &str) -> Result<Self, KMedoidsError> {
		let name = s.trim();
		match name {
			"manhattan" => Ok(Loss::Manhattan),
			"cos" => Ok(Loss::Cosine),
			"inf" => Ok(Loss::LInf),
			_ => {
				let digits = name.strip_prefix('L').unwrap_or(name);
				if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
					match digits.parse::<u32>() {
						Ok(p) if p >= 1 => return Ok(Loss::Lp(p)),
						_ => {}
					}
				}
				Err(KMedoidsError::InvalidLoss(name.to_string()))
			}
		}
	}
}

impl fmt::Display for Loss {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Loss::Manhattan => write!(f, "manhattan"),
			Loss::Cosine => write!(f, "cos"),
			Loss::LInf => write!(f, "inf"),
			Loss::Lp(p) => write!(f, "L{}", p),
		}
	}
}
