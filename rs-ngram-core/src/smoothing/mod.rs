//! Smoothing strategies: turning trie counts into probabilities.
//!
//! Two capabilities are exposed:
//! - [`SimpleSmoothing`]: sets probabilities of one level from the counts alone
//! - [`TrainedSmoothing`]: first learns hyperparameters from a corpus with
//!   cross-validated grid search, then behaves like a simple strategy

use std::sync::mpsc;
use std::thread;

use crate::cross_validation::{CrossValidation, KFoldCrossValidation};
use crate::error::{NGramError, NGramResult};
use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Additive smoothing with a delta learned by grid search.
pub mod additive;

/// Good-Turing discounting over a fitted counts-of-counts curve.
pub mod good_turing;

/// Shrinking grid search shared by the trained strategies.
pub mod grid_search;

/// Linear interpolation of the unigram, bigram and trigram levels.
pub mod interpolated;

/// Fixed-delta additive smoothing.
pub mod laplace;

/// Maximum-likelihood estimates, optionally over a restricted dictionary.
pub mod no_smoothing;

/// Options of the hyperparameter search.
pub mod search_options;

pub use additive::AdditiveSmoothing;
pub use good_turing::GoodTuringSmoothing;
pub use interpolated::InterpolatedSmoothing;
pub use laplace::LaplaceSmoothing;
pub use no_smoothing::{NoSmoothing, NoSmoothingWithDictionary, NoSmoothingWithNonRareWords};
pub use search_options::SearchOptions;

/// A strategy that sets the probabilities of one trie level.
pub trait SimpleSmoothing<S: Symbol> {
	/// Sets the probabilities of the n-grams of length `level`.
	///
	/// # Errors
	/// `InvalidLevel` for a level outside `1..=order`; strategy-specific
	/// failures otherwise.
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()>;

	/// Sets the probabilities at the model's own order.
	///
	/// # Errors
	/// Same as `set_probabilities_at_level`.
	fn set_probabilities(&self, model: &mut NGramModel<S>) -> NGramResult<()> {
		let level = model.order();
		self.set_probabilities_at_level(model, level)
	}
}

/// A strategy whose hyperparameters are learned from a corpus.
pub trait TrainedSmoothing<S: Symbol>: SimpleSmoothing<S> {
	/// Learns the hyperparameters for a model of order `n` from `corpus`.
	///
	/// # Errors
	/// Invalid search options or a failing inner strategy.
	fn learn_parameters(&mut self, corpus: &[Vec<S>], n: usize) -> NGramResult<()>;

	/// Learns the hyperparameters, then sets the probabilities of `model`.
	///
	/// # Errors
	/// Same as `learn_parameters` and `set_probabilities`.
	fn train(&mut self, corpus: &[Vec<S>], model: &mut NGramModel<S>) -> NGramResult<()> {
		self.learn_parameters(corpus, model.order())?;
		self.set_probabilities(model)
	}
}

/// Builds one model of order `n` per train fold and runs `prepare` on it.
///
/// Folds are spread over up to `threads` workers; the models come back in
/// fold order whatever the scheduling.
pub(crate) fn train_fold_models<S, F>(
	folds: &KFoldCrossValidation<Vec<S>>,
	n: usize,
	threads: usize,
	prepare: F,
) -> NGramResult<Vec<NGramModel<S>>>
where
	S: Symbol,
	F: Fn(&mut NGramModel<S>) -> NGramResult<()> + Sync,
{
	let k = folds.fold_count();
	let workers = threads.clamp(1, k.max(1));

	let (tx, rx) = mpsc::channel();
	thread::scope(|scope| {
		for worker in 0..workers {
			let tx = tx.clone();
			let prepare = &prepare;
			scope.spawn(move || {
				for fold in (worker..k).step_by(workers) {
					let model = NGramModel::from_corpus(&folds.train_fold(fold), n).and_then(|mut model| {
						prepare(&mut model)?;
						Ok(model)
					});
					if tx.send((fold, model)).is_err() {
						return;
					}
				}
			});
		}
	});
	drop(tx);

	let mut models: Vec<Option<NGramModel<S>>> = (0..k).map(|_| None).collect();
	for (fold, model) in rx {
		models[fold] = Some(model?);
	}
	models
		.into_iter()
		.enumerate()
		.map(|(fold, model)| model.ok_or_else(|| NGramError::Config(format!("fold {fold} was not trained"))))
		.collect()
}

/// Sum over folds of the test-fold perplexity of each fold model.
pub(crate) fn summed_perplexity<S: Symbol>(models: &[NGramModel<S>], test_folds: &[Vec<Vec<S>>]) -> f64 {
	models
		.iter()
		.zip(test_folds)
		.map(|(model, test)| model.perplexity(test))
		.sum()
}
