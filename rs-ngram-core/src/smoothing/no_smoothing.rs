use std::collections::HashSet;

use super::SimpleSmoothing;
use crate::error::NGramResult;
use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Maximum-likelihood probabilities: `count / sum of sibling counts`.
///
/// Unseen continuations get probability 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSmoothing;

impl NoSmoothing {
	pub fn new() -> Self {
		Self
	}
}

impl<S: Symbol> SimpleSmoothing<S> for NoSmoothing {
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()> {
		model.set_probability_with_pseudo_count(0.0, level)
	}
}

/// [`NoSmoothing`] after folding every symbol outside a fixed dictionary
/// into the unknown buckets.
#[derive(Debug, Clone)]
pub struct NoSmoothingWithDictionary<S> {
	dictionary: HashSet<S>,
}

impl<S> NoSmoothingWithDictionary<S> {
	pub fn new(dictionary: HashSet<S>) -> Self {
		Self { dictionary }
	}
}

impl<S: Symbol> SimpleSmoothing<S> for NoSmoothingWithDictionary<S> {
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()> {
		model.check_level(level)?;
		model.replace_unknown_words(&self.dictionary);
		NoSmoothing.set_probabilities_at_level(model, level)
	}
}

/// [`NoSmoothing`] after folding rare symbols into the unknown buckets.
///
/// A symbol is rare when its share of the counts at the smoothed level is
/// at most `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct NoSmoothingWithNonRareWords {
	threshold: f64,
}

impl NoSmoothingWithNonRareWords {
	pub fn new(threshold: f64) -> Self {
		Self { threshold }
	}
}

impl<S: Symbol> SimpleSmoothing<S> for NoSmoothingWithNonRareWords {
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()> {
		model.check_level(level)?;
		let dictionary = model.non_rare_dictionary(level, self.threshold);
		model.replace_unknown_words(&dictionary);
		NoSmoothing.set_probabilities_at_level(model, level)
	}
}
