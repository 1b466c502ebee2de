use log::info;

use super::good_turing::GoodTuringSmoothing;
use super::grid_search::{minimize_1d, minimize_2d};
use super::search_options::SearchOptions;
use super::{SimpleSmoothing, TrainedSmoothing, summed_perplexity, train_fold_models};
use crate::cross_validation::{CrossValidation, KFoldCrossValidation};
use crate::error::NGramResult;
use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Lowest weight tried for every lambda by the first grid.
const LAMBDA_LOWER_BOUND: f64 = 0.1;

/// Highest weight ever tried for a lambda.
const LAMBDA_UPPER_BOUND: f64 = 0.999;

/// Linear interpolation of the levels of a bigram or trigram model.
///
/// Every level is smoothed with the inner strategy `M`, then the levels are
/// mixed with weights learned by cross-validation:
/// - bigram: `lambda1 * P(w2 | w1) + (1 - lambda1) * P(w2)`
/// - trigram: `lambda1 * P(w3 | w1 w2) + lambda2 * P(w3 | w2) + (1 - lambda1 - lambda2) * P(w3)`
///
/// Other orders learn nothing and are only smoothed level by level.
#[derive(Debug, Clone)]
pub struct InterpolatedSmoothing<M = GoodTuringSmoothing> {
	inner: M,
	lambda1: f64,
	lambda2: f64,
	options: SearchOptions,
}

impl<M: Default> Default for InterpolatedSmoothing<M> {
	fn default() -> Self {
		Self::with_inner(M::default())
	}
}

impl InterpolatedSmoothing {
	/// Interpolation over Good-Turing smoothed levels.
	pub fn new() -> Self {
		Self::default()
	}
}

impl<M> InterpolatedSmoothing<M> {
	/// Interpolation over levels smoothed by `inner`.
	pub fn with_inner(inner: M) -> Self {
		Self {
			inner,
			lambda1: 0.0,
			lambda2: 0.0,
			options: SearchOptions::default(),
		}
	}

	pub fn with_options(mut self, options: SearchOptions) -> Self {
		self.options = options;
		self
	}

	/// The learned `(lambda1, lambda2)`; `lambda2` is only used by trigrams.
	pub fn lambdas(&self) -> (f64, f64) {
		(self.lambda1, self.lambda2)
	}
}

/// Smooths levels `2..=n` then level 1 with `inner`.
fn smooth_every_level<S: Symbol, M: SimpleSmoothing<S> + ?Sized>(
	inner: &M,
	model: &mut NGramModel<S>,
) -> NGramResult<()> {
	for level in 2..=model.order() {
		inner.set_probabilities_at_level(model, level)?;
	}
	inner.set_probabilities_at_level(model, 1)
}

impl<S: Symbol, M: SimpleSmoothing<S>> SimpleSmoothing<S> for InterpolatedSmoothing<M> {
	/// Smooths every level and installs the learned lambdas; `level` is
	/// ignored since interpolation always spans all levels.
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, _level: usize) -> NGramResult<()> {
		smooth_every_level(&self.inner, model)?;
		match model.order() {
			2 => model.set_lambda(self.lambda1),
			3 => model.set_lambdas(self.lambda1, self.lambda2),
			_ => {}
		}
		Ok(())
	}
}

impl<S: Symbol, M: SimpleSmoothing<S> + Sync> TrainedSmoothing<S> for InterpolatedSmoothing<M> {
	fn learn_parameters(&mut self, corpus: &[Vec<S>], n: usize) -> NGramResult<()> {
		if n <= 1 {
			return Ok(());
		}
		self.options.validate()?;
		let folds = KFoldCrossValidation::new(corpus, self.options.folds(), self.options.seed());
		let inner = &self.inner;
		let mut models = train_fold_models(&folds, n, self.options.threads(), |model| smooth_every_level(inner, model))?;
		let test_folds: Vec<Vec<Vec<S>>> = (0..folds.fold_count()).map(|k| folds.test_fold(k)).collect();

		match n {
			2 => {
				self.lambda1 = minimize_1d(LAMBDA_LOWER_BOUND, LAMBDA_UPPER_BOUND, &self.options, |lambda| {
					for model in models.iter_mut() {
						model.set_lambda(lambda);
					}
					Ok(summed_perplexity(&models, &test_folds))
				})?;
				info!("learned bigram lambda {}", self.lambda1);
			}
			3 => {
				let (lambda1, lambda2) = minimize_2d(
					LAMBDA_LOWER_BOUND,
					LAMBDA_LOWER_BOUND,
					LAMBDA_UPPER_BOUND,
					&self.options,
					|lambda1, lambda2| {
						for model in models.iter_mut() {
							model.set_lambdas(lambda1, lambda2);
						}
						Ok(summed_perplexity(&models, &test_folds))
					},
				)?;
				self.lambda1 = lambda1;
				self.lambda2 = lambda2;
				info!("learned trigram lambdas {lambda1}, {lambda2}");
			}
			_ => {}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::smoothing::LaplaceSmoothing;

	fn corpus() -> Vec<Vec<String>> {
		["<s> a b c </s>", "<s> a c b </s>", "<s> b a c </s>", "<s> c a b </s>"]
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect()
	}

	#[test]
	fn test_unigram_learns_nothing() {
		let corpus = corpus();
		let mut smoothing = InterpolatedSmoothing::with_inner(LaplaceSmoothing::new());
		let mut model = NGramModel::from_corpus(&corpus, 1).unwrap();
		model.train_probabilities(&corpus, &mut smoothing).unwrap();
		assert_eq!(smoothing.lambdas(), (0.0, 0.0));
		assert!(!model.is_interpolated());
		assert!(model.probability(&["a".to_owned()]) > 0.0);
	}

	#[test]
	fn test_set_probabilities_installs_lambdas() {
		let corpus = corpus();
		let smoothing = InterpolatedSmoothing::with_inner(LaplaceSmoothing::new());
		let mut model = NGramModel::from_corpus(&corpus, 2).unwrap();
		model.compute_probabilities(&smoothing).unwrap();
		assert!(model.is_interpolated());
		// Every level was smoothed, not only the highest one.
		assert!(model.unseen_probability(1).unwrap() > 0.0);
		assert!(model.unseen_probability(2).unwrap() > 0.0);
	}

	#[test]
	fn test_bigram_lambda_learned_in_range() {
		let corpus: Vec<Vec<String>> = corpus().into_iter().cycle().take(20).collect();
		let mut smoothing = InterpolatedSmoothing::with_inner(LaplaceSmoothing::new())
			.with_options(SearchOptions::new().with_folds(4).with_threads(2));
		let mut model = NGramModel::from_corpus(&corpus, 2).unwrap();
		model.train_probabilities(&corpus, &mut smoothing).unwrap();

		let (lambda1, _) = smoothing.lambdas();
		assert!((0.0..=0.999).contains(&lambda1), "lambda1 = {lambda1}");
		assert_eq!(model.lambdas().0, lambda1);
	}
}
