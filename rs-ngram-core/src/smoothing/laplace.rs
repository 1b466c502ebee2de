use super::SimpleSmoothing;
use crate::error::NGramResult;
use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Additive smoothing with a fixed pseudo-count (add-one by default).
#[derive(Debug, Clone, Copy)]
pub struct LaplaceSmoothing {
	delta: f64,
}

impl Default for LaplaceSmoothing {
	fn default() -> Self {
		Self { delta: 1.0 }
	}
}

impl LaplaceSmoothing {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_delta(delta: f64) -> Self {
		Self { delta }
	}

	pub fn delta(&self) -> f64 {
		self.delta
	}
}

impl<S: Symbol> SimpleSmoothing<S> for LaplaceSmoothing {
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()> {
		model.set_probability_with_pseudo_count(self.delta, level)
	}
}
