use log::info;

use super::grid_search::minimize_1d;
use super::search_options::SearchOptions;
use super::{SimpleSmoothing, TrainedSmoothing, summed_perplexity, train_fold_models};
use crate::cross_validation::{CrossValidation, KFoldCrossValidation};
use crate::error::NGramResult;
use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Lowest pseudo-count tried by the first grid.
const DELTA_LOWER_BOUND: f64 = 0.1;

/// Highest pseudo-count ever tried.
const DELTA_UPPER_BOUND: f64 = 1.0;

/// Additive smoothing whose pseudo-count is learned by cross-validation.
///
/// `learn_parameters` trains one model per fold and keeps the delta in
/// `[0.1, 1]` that minimizes the summed test-fold perplexity. Before any
/// training the delta is 0, which is plain maximum likelihood.
#[derive(Debug, Clone, Default)]
pub struct AdditiveSmoothing {
	delta: f64,
	options: SearchOptions,
}

impl AdditiveSmoothing {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_options(options: SearchOptions) -> Self {
		Self { delta: 0.0, options }
	}

	/// The learned pseudo-count.
	pub fn delta(&self) -> f64 {
		self.delta
	}
}

impl<S: Symbol> SimpleSmoothing<S> for AdditiveSmoothing {
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()> {
		model.set_probability_with_pseudo_count(self.delta, level)
	}
}

impl<S: Symbol> TrainedSmoothing<S> for AdditiveSmoothing {
	fn learn_parameters(&mut self, corpus: &[Vec<S>], n: usize) -> NGramResult<()> {
		self.options.validate()?;
		let folds = KFoldCrossValidation::new(corpus, self.options.folds(), self.options.seed());
		let mut models = train_fold_models(&folds, n, self.options.threads(), |_| Ok(()))?;
		let test_folds: Vec<Vec<Vec<S>>> = (0..folds.fold_count()).map(|k| folds.test_fold(k)).collect();

		self.delta = minimize_1d(DELTA_LOWER_BOUND, DELTA_UPPER_BOUND, &self.options, |delta| {
			for model in models.iter_mut() {
				model.set_probability_with_pseudo_count(delta, n)?;
			}
			Ok(summed_perplexity(&models, &test_folds))
		})?;
		info!("learned additive delta {} for order {n}", self.delta);
		Ok(())
	}
}
