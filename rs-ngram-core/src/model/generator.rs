use rand::Rng;
use rand::seq::IteratorRandom;

use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Length cap used when none is configured.
pub const DEFAULT_MAX_LENGTH: usize = 50;

/// How the generated sequence begins.
///
/// # Variants
/// - `Empty`: start from nothing; the first symbol is drawn from the root's
///   children, so level 1 must carry probabilities (smooth it with
///   `compute_probabilities_at_level(.., 1)` or an interpolated strategy).
///   Otherwise nothing is drawn and the sequence stays empty.
/// - `Random(usize)`: start from a path of the given length found in the trie,
///   chosen one uniformly drawn child per level. The length is clamped to
///   `1..=order - 1` (to 1 for a unigram model).
/// - `Custom(Vec<S>)`: start from the given symbols.
#[derive(Debug, Clone, PartialEq)]
pub enum StartSeed<S> {
	Empty,
	Random(usize),
	Custom(Vec<S>),
}

/// Draws sequences from a smoothed model.
///
/// # Responsibilities
/// - Resolve the start of the sequence from a `StartSeed`
/// - Extend it with the model until the end symbol, a dead end or the length cap
///
/// The random source is always supplied by the caller, so a seeded RNG
/// gives reproducible output.
#[derive(Debug)]
pub struct Generator<'a, S> {
	model: &'a NGramModel<S>,
	max_length: usize,
	end: Option<S>,
}

impl<'a, S: Symbol + Ord> Generator<'a, S> {
	pub fn new(model: &'a NGramModel<S>) -> Self {
		Self {
			model,
			max_length: DEFAULT_MAX_LENGTH,
			end: None,
		}
	}

	/// Maximum number of symbols in a generated sequence, start included.
	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = max_length;
		self
	}

	/// Symbol that ends a sequence as soon as it is drawn.
	pub fn with_end(mut self, end: S) -> Self {
		self.end = Some(end);
		self
	}

	/// The symbols a sequence starts with.
	///
	/// Returns `None` if a random start was requested and the trie has no
	/// path to draw it from.
	pub fn start<R: Rng + ?Sized>(&self, seed: &StartSeed<S>, rng: &mut R) -> Option<Vec<S>> {
		match seed {
			StartSeed::Empty => Some(Vec::new()),
			StartSeed::Custom(symbols) => Some(symbols.clone()),
			StartSeed::Random(length) => {
				let length = (*length).clamp(1, self.model.order().saturating_sub(1).max(1));
				let mut node = self.model.root();
				let mut path = Vec::with_capacity(length);
				for _ in 0..length {
					let mut children: Vec<_> = node.children().collect();
					children.sort_by(|a, b| a.0.cmp(b.0));
					let (symbol, child) = children.into_iter().choose(rng)?;
					path.push(symbol.clone());
					node = child;
				}
				Some(path)
			}
		}
	}

	/// Generates one sequence.
	///
	/// Returns `None` when the start cannot be resolved.
	pub fn generate<R: Rng + ?Sized>(&self, seed: &StartSeed<S>, rng: &mut R) -> Option<Vec<S>> {
		let start = self.start(seed, rng)?;
		Some(self.model.generate(rng, &start, self.max_length, self.end.as_ref()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::smoothing::NoSmoothing;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn model() -> NGramModel<String> {
		let corpus: Vec<Vec<String>> = ["<s> ali topu at </s>", "<s> ali eve git </s>"]
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect();
		let mut model = NGramModel::from_corpus(&corpus, 2).unwrap();
		model.compute_probabilities(&NoSmoothing).unwrap();
		model
	}

	#[test]
	fn test_custom_start_reaches_end() {
		let model = model();
		let generator = Generator::new(&model).with_end("</s>".to_owned());
		let mut rng = StdRng::seed_from_u64(11);
		let seed = StartSeed::Custom(vec!["<s>".to_owned()]);

		let sequence = generator.generate(&seed, &mut rng).unwrap();
		assert_eq!(sequence.first().map(String::as_str), Some("<s>"));
		assert_eq!(sequence.last().map(String::as_str), Some("</s>"));
		assert_eq!(sequence[1], "ali");
	}

	#[test]
	fn test_same_seed_same_sequence() {
		let model = model();
		let generator = Generator::new(&model).with_max_length(4);
		let seed = StartSeed::Random(1);
		let a = generator.generate(&seed, &mut StdRng::seed_from_u64(5)).unwrap();
		let b = generator.generate(&seed, &mut StdRng::seed_from_u64(5)).unwrap();
		assert_eq!(a, b);
		assert!(!a.is_empty() && a.len() <= 4);
	}

	#[test]
	fn test_random_start_on_empty_model() {
		let model = NGramModel::<String>::new(2).unwrap();
		let generator = Generator::new(&model);
		assert_eq!(generator.start(&StartSeed::Random(3), &mut StdRng::seed_from_u64(0)), None);
		assert_eq!(generator.generate(&StartSeed::Empty, &mut StdRng::seed_from_u64(0)), Some(vec![]));
	}

	#[test]
	fn test_empty_start_needs_first_level() {
		let mut model = model();
		let generator_output = |model: &NGramModel<String>| {
			Generator::new(model)
				.with_end("</s>".to_owned())
				.generate(&StartSeed::Empty, &mut StdRng::seed_from_u64(3))
				.unwrap()
		};
		assert!(generator_output(&model).is_empty());

		model.compute_probabilities_at_level(&NoSmoothing, 1).unwrap();
		let sequence = generator_output(&model);
		assert!(!sequence.is_empty());
		assert!(model.vocabulary().contains(&sequence[0]));
	}
}
