mod common;

use common::{assert_close, corpus, model, words};
use rs_ngram_core::smoothing::{
	AdditiveSmoothing, GoodTuringSmoothing, InterpolatedSmoothing, SearchOptions, TrainedSmoothing,
};
use rs_ngram_core::NGramModel;

#[test]
fn test_additive_delta_is_learned_and_applied() {
	let corpus = corpus();
	let mut smoothing = AdditiveSmoothing::with_options(SearchOptions::new().with_seed(3));
	let mut bigram = model(2);
	bigram.train_probabilities(&corpus, &mut smoothing).unwrap();

	let delta = smoothing.delta();
	assert!(delta > 0.0 && delta <= 1.0, "delta = {delta}");
	assert_close(bigram.probability(&words("<s> ali")), (4.0 + delta) / (5.0 + 16.0 * delta));
	assert_close(bigram.probability(&words("ayşe ali")), delta / (2.0 + 16.0 * delta));
	assert_eq!(bigram.unseen_probability(2), Some(1.0 / 16.0));
	assert!(bigram.perplexity(&corpus).is_finite());
}

#[test]
fn test_additive_search_is_reproducible() {
	let corpus = corpus();
	let options = SearchOptions::new().with_folds(5).with_seed(9);
	let mut sequential = AdditiveSmoothing::with_options(options.clone().with_threads(1));
	let mut parallel = AdditiveSmoothing::with_options(options.with_threads(4));

	TrainedSmoothing::<String>::learn_parameters(&mut sequential, &corpus, 1).unwrap();
	TrainedSmoothing::<String>::learn_parameters(&mut parallel, &corpus, 1).unwrap();
	assert_eq!(sequential.delta(), parallel.delta());
}

#[test]
fn test_interpolated_bigram() {
	let corpus = corpus();
	let mut smoothing = InterpolatedSmoothing::new();
	let mut bigram = model(2);
	bigram.train_probabilities(&corpus, &mut smoothing).unwrap();

	let (lambda1, _) = smoothing.lambdas();
	assert!(lambda1 > 0.0 && lambda1 <= 0.999, "lambda1 = {lambda1}");
	assert!(bigram.is_interpolated());
	assert_eq!(bigram.lambdas().0, lambda1);

	let unigram = bigram.probability(&words("ali"));
	let conditional = bigram
		.root()
		.child(&"<s>".to_owned())
		.and_then(|context| context.child(&"ali".to_owned()))
		.unwrap()
		.probability();
	assert_close(
		bigram.probability(&words("<s> ali")),
		lambda1 * conditional + (1.0 - lambda1) * unigram,
	);
	let perplexity = bigram.perplexity(&corpus);
	assert!(perplexity.is_finite() && perplexity > 1.0);
}

#[test]
fn test_interpolated_trigram_lambdas_sum_below_one() {
	let corpus = corpus();
	let mut smoothing = InterpolatedSmoothing::with_inner(GoodTuringSmoothing)
		.with_options(SearchOptions::new().with_folds(5));
	let mut trigram = model(3);
	trigram.train_probabilities(&corpus, &mut smoothing).unwrap();

	let (lambda1, lambda2) = smoothing.lambdas();
	assert!(lambda1 > 0.0 && lambda2 > 0.0, "lambdas = {lambda1}, {lambda2}");
	assert!(lambda1 + lambda2 < 1.0, "lambdas = {lambda1}, {lambda2}");
	assert_eq!(trigram.lambdas(), (lambda1, lambda2));
	assert!(trigram.is_interpolated());

	// An unseen word still gets mass from the unigram level.
	let p = trigram.probability(&words("ali topu hasan"));
	assert!(p > 0.0 && p < 1.0);
	assert!(trigram.perplexity(&corpus).is_finite());
}

#[test]
fn test_merged_halves_match_full_model() {
	let corpus = corpus();
	let (first, second) = corpus.split_at(2);
	let mut merged = NGramModel::from_corpus(first, 3).unwrap();
	assert!(merged.merge(&NGramModel::from_corpus(second, 3).unwrap()));

	let full = model(3);
	assert_eq!(merged.vocabulary(), full.vocabulary());
	for sentence in &corpus {
		for length in 1..=3 {
			for window in sentence.windows(length) {
				assert_eq!(merged.count(window), full.count(window), "{window:?}");
			}
		}
	}

	let bigram = NGramModel::from_corpus(&corpus, 2).unwrap();
	assert!(!merged.merge(&bigram));
}
