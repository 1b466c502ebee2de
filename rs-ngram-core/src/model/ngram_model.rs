use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::hash::Hash;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ngram_node::NGramNode;
use super::symbol::{Symbol, SymbolCodec};
use crate::error::{NGramError, NGramResult};
use crate::io::{LineReader, MultipleFile, build_output_path};
use crate::smoothing::{SimpleSmoothing, TrainedSmoothing};

/// An n-gram language model of order `n` over symbols of type `S`.
///
/// The model owns a trie of counts, the vocabulary and the fallback
/// probability of every level. Counts are filled by `add_sentence`;
/// probabilities are filled afterwards by a smoothing strategy.
///
/// # Responsibilities
/// - Build the trie from sentences or single n-grams
/// - Answer probability, count and perplexity queries
/// - Combine levels with interpolation weights (bigram and trigram)
/// - Persist itself as text, or as a binary snapshot
///
/// # Invariants
/// - `n >= 1`
/// - `probability_of_unseen` has exactly `n` entries
/// - `vocabulary` holds every symbol ever added
/// - The trie is never deeper than `n`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound(
	serialize = "S: Serialize",
	deserialize = "S: Deserialize<'de> + Eq + Hash"
))]
pub struct NGramModel<S> {
	/// The order of the model (1 = unigram, 2 = bigram, ...)
	n: usize,

	/// Weight of the highest order when interpolating.
	lambda1: f64,

	/// Weight of the bigram level in a trigram interpolation.
	lambda2: f64,

	/// Whether `probability` combines levels with the lambdas.
	interpolated: bool,

	/// Every symbol seen at least once.
	vocabulary: HashSet<S>,

	/// Fallback probability of each level, index `level - 1`.
	probability_of_unseen: Vec<f64>,

	/// Root of the count trie; holds no symbol and a zero count.
	root: NGramNode<S>,
}

impl<S: Symbol> NGramModel<S> {
	/// Creates an empty model of order `n`.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `n == 0`.
	pub fn new(n: usize) -> NGramResult<Self> {
		if n == 0 {
			return Err(NGramError::InvalidOrder(n));
		}
		Ok(Self {
			n,
			lambda1: 0.0,
			lambda2: 0.0,
			interpolated: false,
			vocabulary: HashSet::new(),
			probability_of_unseen: vec![0.0; n],
			root: NGramNode::new(),
		})
	}

	/// Creates a model of order `n` and adds every sentence of `corpus`.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `n == 0`.
	pub fn from_corpus(corpus: &[Vec<S>], n: usize) -> NGramResult<Self> {
		let mut model = Self::new(n)?;
		for sentence in corpus {
			model.add_sentence(sentence, 1);
		}
		Ok(model)
	}

	/// Adds a single n-gram: the first `n` symbols of `symbols` form one path.
	///
	/// All symbols, including any beyond the first `n`, join the vocabulary.
	pub fn add_ngram(&mut self, symbols: &[S]) {
		self.vocabulary.extend(symbols.iter().cloned());
		self.root.add_path(symbols, 0, self.n, 1);
	}

	/// Adds every window of length `n` of `symbols`, `multiplier` times.
	///
	/// Every symbol joins the vocabulary, even in a sentence shorter than `n`.
	pub fn add_sentence(&mut self, symbols: &[S], multiplier: usize) {
		self.vocabulary.extend(symbols.iter().cloned());
		if symbols.len() < self.n {
			return;
		}
		for start in 0..=symbols.len() - self.n {
			self.root.add_path(symbols, start, self.n, multiplier);
		}
	}

	/// Merges another model of the same order into this one.
	///
	/// Vocabularies are united and trie counts are added node by node.
	/// Returns `false`, and leaves `self` untouched, when the orders differ.
	pub fn merge(&mut self, other: &Self) -> bool {
		if self.n != other.n {
			return false;
		}
		self.vocabulary.extend(other.vocabulary.iter().cloned());
		self.root.merge(&other.root);
		true
	}

	pub fn order(&self) -> usize {
		self.n
	}

	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary.len()
	}

	pub fn vocabulary(&self) -> &HashSet<S> {
		&self.vocabulary
	}

	/// Root of the count trie.
	pub fn root(&self) -> &NGramNode<S> {
		&self.root
	}

	/// Sets the bigram weight: `lambda1 * bigram + (1 - lambda1) * unigram`.
	///
	/// Only a bigram model is affected; other orders ignore the call.
	pub fn set_lambda(&mut self, lambda1: f64) {
		if self.n == 2 {
			self.interpolated = true;
			self.lambda1 = lambda1;
		}
	}

	/// Sets the trigram weights:
	/// `lambda1 * trigram + lambda2 * bigram + (1 - lambda1 - lambda2) * unigram`.
	///
	/// Only a trigram model is affected; other orders ignore the call.
	pub fn set_lambdas(&mut self, lambda1: f64, lambda2: f64) {
		if self.n == 3 {
			self.interpolated = true;
			self.lambda1 = lambda1;
			self.lambda2 = lambda2;
		}
	}

	pub fn lambdas(&self) -> (f64, f64) {
		(self.lambda1, self.lambda2)
	}

	pub fn is_interpolated(&self) -> bool {
		self.interpolated
	}

	/// Fallback probability of a level (`1..=n`), `None` outside that range.
	pub fn unseen_probability(&self, level: usize) -> Option<f64> {
		level.checked_sub(1).and_then(|i| self.probability_of_unseen.get(i)).copied()
	}

	/// Sets probabilities at the model's own order with `smoothing`.
	///
	/// # Errors
	/// Whatever the strategy reports.
	pub fn compute_probabilities(&mut self, smoothing: &dyn SimpleSmoothing<S>) -> NGramResult<()> {
		smoothing.set_probabilities(self)
	}

	/// Sets probabilities of one level with `smoothing`.
	///
	/// # Errors
	/// Whatever the strategy reports, `InvalidLevel` included.
	pub fn compute_probabilities_at_level(
		&mut self,
		smoothing: &dyn SimpleSmoothing<S>,
		level: usize,
	) -> NGramResult<()> {
		smoothing.set_probabilities_at_level(self, level)
	}

	/// Learns the strategy's hyperparameters on `corpus`, then sets
	/// probabilities with them.
	///
	/// # Errors
	/// Whatever the strategy reports.
	pub fn train_probabilities(
		&mut self,
		corpus: &[Vec<S>],
		smoothing: &mut dyn TrainedSmoothing<S>,
	) -> NGramResult<()> {
		smoothing.train(corpus, self)
	}

	/// Probability of a sequence of up to three symbols.
	///
	/// - One symbol: its unigram probability, at any order
	/// - Two symbols: bigram probability; a bigram model may interpolate it
	///   with the unigram of the second symbol
	/// - Three symbols (trigram model): trigram probability, interpolated
	///   with the bigram and unigram of the trailing symbols when lambdas are set
	///
	/// An unseen context falls back to the unseen probability of its level.
	/// Symbols beyond the model's order are ignored. Orders above 3, and
	/// an empty query, give `0.0`.
	pub fn probability(&self, symbols: &[S]) -> f64 {
		match (self.n, symbols.len()) {
			(_, 0) => 0.0,
			(1, _) | (2 | 3, 1) => self.level_probability(&symbols[..1], 1),
			(2, _) => {
				let bigram = self.level_probability(&symbols[..2], 2);
				if self.interpolated {
					self.lambda1 * bigram + (1.0 - self.lambda1) * self.level_probability(&symbols[1..2], 1)
				} else {
					bigram
				}
			}
			(3, 2) => self.level_probability(&symbols[..2], 2),
			(3, _) => {
				let trigram = self.level_probability(&symbols[..3], 3);
				if self.interpolated {
					self.lambda1 * trigram
						+ self.lambda2 * self.level_probability(&symbols[1..3], 2)
						+ (1.0 - self.lambda1 - self.lambda2) * self.level_probability(&symbols[2..3], 1)
				} else {
					trigram
				}
			}
			_ => 0.0,
		}
	}

	/// Trie probability of `path`, or the level's fallback when the
	/// context is unseen.
	fn level_probability(&self, path: &[S], level: usize) -> f64 {
		self.root
			.path_probability(path)
			.unwrap_or_else(|| self.unseen_probability(level).unwrap_or(0.0))
	}

	/// Occurrences of `symbols` in the training data.
	pub fn count(&self, symbols: &[S]) -> usize {
		self.root.count_path(symbols, 0)
	}

	/// Perplexity of `corpus`: `exp` of the mean negative log probability
	/// over every window of length `n`.
	///
	/// Returns `0.0` for orders above 3 and for a corpus without any
	/// full window.
	pub fn perplexity(&self, corpus: &[Vec<S>]) -> f64 {
		if self.n > 3 {
			return 0.0;
		}
		let mut sum = 0.0;
		let mut count = 0usize;
		for sentence in corpus {
			for window in sentence.windows(self.n) {
				sum -= self.probability(window).ln();
				count += 1;
			}
		}
		if count == 0 {
			return 0.0;
		}
		(sum / count as f64).exp()
	}

	pub(crate) fn check_level(&self, level: usize) -> NGramResult<()> {
		if level == 0 || level > self.n {
			return Err(NGramError::InvalidLevel { level, order: self.n });
		}
		Ok(())
	}

	/// Sets additive probabilities at `height` with pseudo-count `delta`.
	///
	/// The vocabulary size in the denominators is `|V| + 1` when `delta`
	/// is non-zero (one slot for the unseen class), `|V|` otherwise. The
	/// level's unseen probability becomes `1 / vocabulary size`.
	///
	/// # Errors
	/// `InvalidLevel` if `height` is not in `1..=n`.
	pub fn set_probability_with_pseudo_count(&mut self, delta: f64, height: usize) -> NGramResult<()> {
		self.check_level(height)?;
		let vocabulary_size = if delta != 0.0 {
			self.vocabulary.len() as f64 + 1.0
		} else {
			self.vocabulary.len() as f64
		};
		self.root.set_probability_with_pseudo_count(delta, height, vocabulary_size);
		self.probability_of_unseen[height - 1] = 1.0 / vocabulary_size;
		Ok(())
	}

	/// Histogram of n-gram counts at `height`: entry `r` is the number of
	/// n-grams seen exactly `r` times. The table has `max + 2` entries.
	pub fn counts_of_counts(&self, height: usize) -> Vec<usize> {
		let max = self.root.max_occurrence(height);
		let mut table = vec![0; max + 2];
		self.root.update_counts_of_counts(&mut table, height);
		table
	}

	/// Sets Good-Turing probabilities at `height` from the smoothed
	/// counts-of-counts `n` and the unseen mass `p_zero`.
	///
	/// # Errors
	/// `InvalidLevel` for a bad `height`, `RegressionFailed` if `n` lacks a
	/// positive entry needed for discounting.
	pub fn set_adjusted_probability(&mut self, n: &[f64], height: usize, p_zero: f64) -> NGramResult<()> {
		self.check_level(height)?;
		let vocabulary_size = self.vocabulary.len() as f64 + 1.0;
		self.root.set_adjusted_probability(n, height, vocabulary_size, p_zero)?;
		self.probability_of_unseen[height - 1] = 1.0 / vocabulary_size;
		Ok(())
	}

	/// Prunes the deepest level of the trie: children whose relative
	/// frequency is below `threshold` are removed, the strongest always stays.
	///
	/// Thresholds outside `(0, 1]` are ignored.
	pub fn prune(&mut self, threshold: f64)
	where
		S: Ord,
	{
		if threshold > 0.0 && threshold <= 1.0 {
			self.root.prune(threshold, self.n - 1);
		}
	}

	/// Moves every symbol outside `dictionary` into per-node unknown buckets.
	pub fn replace_unknown_words(&mut self, dictionary: &HashSet<S>) {
		self.root.replace_unknown_words(dictionary);
	}

	/// Symbols whose share of the total count at `level` exceeds `threshold`.
	pub fn non_rare_dictionary(&self, level: usize, threshold: f64) -> HashSet<S> {
		let mut counter = HashMap::new();
		self.root.count_words(&mut counter, level);
		let total: usize = counter.values().sum();
		counter
			.into_iter()
			.filter(|(_, count)| *count as f64 / total as f64 > threshold)
			.map(|(symbol, _)| symbol)
			.collect()
	}

	/// Draws the symbol following `context` with `rng`.
	///
	/// `None` when the context is unknown or the draw falls in the unseen mass.
	pub fn generate_next_symbol<R>(&self, context: &[S], rng: &mut R) -> Option<S>
	where
		S: Ord,
		R: Rng + ?Sized,
	{
		self.root.generate_next_symbol(context, rng)
	}

	/// Extends `start` one symbol at a time, using the last `n - 1` symbols
	/// as context.
	///
	/// Stops once the sequence holds `max_length` symbols, after `end` is
	/// drawn, or when no continuation is drawn. `start` is part of the result.
	pub fn generate<R>(&self, rng: &mut R, start: &[S], max_length: usize, end: Option<&S>) -> Vec<S>
	where
		S: Ord,
		R: Rng + ?Sized,
	{
		let mut sequence = start.to_vec();
		while sequence.len() < max_length {
			let context_length = sequence.len().min(self.n - 1);
			let context = &sequence[sequence.len() - context_length..];
			let Some(symbol) = self.root.generate_next_symbol(context, rng) else {
				break;
			};
			let is_end = end == Some(&symbol);
			sequence.push(symbol);
			if is_end {
				break;
			}
		}
		sequence
	}

	/// Writes the model in the text format:
	///
	/// ```text
	/// <n> <lambda1> <lambda2>
	/// <unseen_1> ... <unseen_n>
	/// <vocabulary size>
	/// <one symbol per line>
	/// <trie, depth first>
	/// ```
	///
	/// # Errors
	/// Any write failure.
	pub fn write_to<W, C>(&self, writer: &mut W, codec: &C) -> io::Result<()>
	where
		W: Write,
		C: SymbolCodec<S> + ?Sized,
	{
		writeln!(writer, "{} {} {}", self.n, self.lambda1, self.lambda2)?;
		let unseen: Vec<String> = self.probability_of_unseen.iter().map(f64::to_string).collect();
		writeln!(writer, "{}", unseen.join(" "))?;

		let mut vocabulary: Vec<String> = self.vocabulary.iter().map(|s| codec.encode(s)).collect();
		vocabulary.sort();
		writeln!(writer, "{}", vocabulary.len())?;
		for symbol in &vocabulary {
			writeln!(writer, "{symbol}")?;
		}

		self.root.write_text(writer, codec, 0)
	}

	/// Saves the model as text to `path`.
	///
	/// # Errors
	/// I/O failures.
	pub fn save<P, C>(&self, path: P, codec: &C) -> NGramResult<()>
	where
		P: AsRef<Path>,
		C: SymbolCodec<S> + ?Sized,
	{
		let path = path.as_ref();
		let mut writer = BufWriter::new(File::create(path)?);
		self.write_to(&mut writer, codec)?;
		writer.flush()?;
		info!("saved {}-gram model ({} symbols) to {}", self.n, self.vocabulary.len(), path.display());
		Ok(())
	}

	/// Reads a model written by `write_to`.
	///
	/// # Errors
	/// `Parse` or `UnexpectedEof` on malformed input, `Symbol` when the
	/// codec rejects a symbol, `InvalidOrder` for a zero order.
	pub fn read_from<R, C>(reader: R, codec: &C) -> NGramResult<Self>
	where
		R: BufRead,
		C: SymbolCodec<S> + ?Sized,
	{
		Self::read_lines(reader.lines(), codec)
	}

	/// Loads a text model from `path`.
	///
	/// # Errors
	/// Same as `read_from`, plus I/O failures.
	pub fn load<P, C>(path: P, codec: &C) -> NGramResult<Self>
	where
		P: AsRef<Path>,
		C: SymbolCodec<S> + ?Sized,
	{
		let path = path.as_ref();
		let model = Self::read_from(BufReader::new(File::open(path)?), codec)?;
		info!("loaded {}-gram model ({} symbols) from {}", model.n, model.vocabulary.len(), path.display());
		Ok(model)
	}

	/// Loads a text model split across `paths`, read as one file.
	///
	/// # Errors
	/// Same as `load`.
	pub fn load_multi<P, C>(paths: &[P], codec: &C) -> NGramResult<Self>
	where
		P: AsRef<Path>,
		C: SymbolCodec<S> + ?Sized,
	{
		let model = Self::read_lines(MultipleFile::new(paths)?, codec)?;
		info!("loaded {}-gram model ({} symbols) from {} parts", model.n, model.vocabulary.len(), paths.len());
		Ok(model)
	}

	fn read_lines<I, C>(lines: I, codec: &C) -> NGramResult<Self>
	where
		I: Iterator<Item = io::Result<String>>,
		C: SymbolCodec<S> + ?Sized,
	{
		let mut reader = LineReader::new(lines);

		let header = reader.next_line()?;
		let items: Vec<&str> = header.split_whitespace().collect();
		let &[n, lambda1, lambda2] = items.as_slice() else {
			return Err(reader.error(format!("expected 3 header fields, found {}", items.len())));
		};
		let n: usize = reader.parse_field(n, "order")?;
		let mut model = Self::new(n)?;
		model.lambda1 = reader.parse_field(lambda1, "lambda1")?;
		model.lambda2 = reader.parse_field(lambda2, "lambda2")?;
		// Only `set_lambda`/`set_lambdas` ever write a non-zero weight.
		model.interpolated = (n == 2 || n == 3) && model.lambda1 != 0.0;

		let line = reader.next_line()?;
		let items: Vec<&str> = line.split_whitespace().collect();
		if items.len() != n {
			return Err(reader.error(format!("expected {n} unseen probabilities, found {}", items.len())));
		}
		for (slot, item) in model.probability_of_unseen.iter_mut().zip(items) {
			*slot = reader.parse_field(item, "unseen probability")?;
		}

		let line = reader.next_line()?;
		let vocabulary_size: usize = reader.parse_field(line.trim(), "vocabulary size")?;
		for _ in 0..vocabulary_size {
			let line = reader.next_line()?;
			model.vocabulary.insert(codec.decode(line.trim())?);
		}

		model.root = NGramNode::read_text(&mut reader, codec)?;
		Ok(model)
	}
}

impl<S: Symbol + Serialize + DeserializeOwned> NGramModel<S> {
	/// Opens a text model through its binary snapshot.
	///
	/// - If `<stem>.bin` exists next to `path`, it is deserialized with `postcard`
	/// - Otherwise the text file is parsed and the snapshot is written
	///
	/// # Errors
	/// Text parsing, snapshot (de)serialization and I/O failures.
	pub fn open_cached<P, C>(path: P, codec: &C) -> NGramResult<Self>
	where
		P: AsRef<Path>,
		C: SymbolCodec<S> + ?Sized,
	{
		let binary_data_path = build_output_path(&path, "bin")?;
		if binary_data_path.exists() {
			let bytes = std::fs::read(&binary_data_path)?;
			let model: Self = postcard::from_bytes(&bytes)?;
			info!("loaded snapshot {}", binary_data_path.display());
			return Ok(model);
		}

		let model = Self::load(&path, codec)?;
		let bytes = postcard::to_stdvec(&model)?;
		std::fs::write(&binary_data_path, bytes)?;
		info!("wrote snapshot {}", binary_data_path.display());
		Ok(model)
	}
}
