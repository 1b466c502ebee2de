use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::{self, Write};

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::symbol::{Symbol, SymbolCodec};
use crate::error::{NGramError, NGramResult};
use crate::io::LineReader;

/// Raw counts above this value are used as-is by Good-Turing discounting.
const GOOD_TURING_MAX_DISCOUNTED_COUNT: usize = 5;

/// A child reached while resolving a queried symbol.
///
/// Lookups first try the child labelled with the symbol itself and
/// fall back to the synthetic bucket built by `replace_unknown_words`.
#[derive(Debug)]
pub enum Child<'a, S> {
	/// The child labelled with the queried symbol.
	Known(&'a NGramNode<S>),
	/// The bucket aggregating every child outside the dictionary.
	UnknownBucket(&'a NGramNode<S>),
}

impl<'a, S> Child<'a, S> {
	/// The resolved node, whichever variant it came from.
	pub fn node(&self) -> &'a NGramNode<S> {
		match self {
			Child::Known(node) | Child::UnknownBucket(node) => node,
		}
	}
}

/// One node of the n-gram trie.
///
/// A node stands for the path of symbols leading to it from the root;
/// the root itself stands for the empty path. Edges are labelled by
/// the keys of `children`.
///
/// ## Responsibilities
/// - Count every occurrence of its path in the training data
/// - Hold the smoothed probability of its path given the parent path
/// - Hold the probability mass left for children never observed
///
/// ## Invariants
/// - `count` equals the number of times the path occurred in training
/// - Depth below the root never exceeds the model order
/// - A node with no children is a leaf
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound(
	serialize = "S: Serialize",
	deserialize = "S: Deserialize<'de> + Eq + Hash"
))]
pub struct NGramNode<S> {
	/// Occurrences of the path ending at this node.
	count: usize,
	/// Probability of this node's symbol given the parent path.
	probability: f64,
	/// Probability assigned to any child symbol not in `children`.
	probability_of_unseen: f64,
	/// Observed continuations of this path.
	children: HashMap<S, NGramNode<S>>,
	/// Children removed because their symbol is outside a dictionary.
	unknown: Option<Box<NGramNode<S>>>,
}

impl<S> Default for NGramNode<S> {
	fn default() -> Self {
		Self {
			count: 0,
			probability: 0.0,
			probability_of_unseen: 0.0,
			children: HashMap::new(),
			unknown: None,
		}
	}
}

impl<S: Symbol> NGramNode<S> {
	/// Creates an empty node with a zero count.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn count(&self) -> usize {
		self.count
	}

	pub fn probability(&self) -> f64 {
		self.probability
	}

	pub fn probability_of_unseen(&self) -> f64 {
		self.probability_of_unseen
	}

	/// Number of known children (the unknown bucket is not counted).
	pub fn size(&self) -> usize {
		self.children.len()
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// The known child labelled with `symbol`.
	pub fn child(&self, symbol: &S) -> Option<&NGramNode<S>> {
		self.children.get(symbol)
	}

	/// Iterates over the known children.
	pub fn children(&self) -> impl Iterator<Item = (&S, &NGramNode<S>)> {
		self.children.iter()
	}

	/// The bucket of children replaced by `replace_unknown_words`, if any.
	pub fn unknown(&self) -> Option<&NGramNode<S>> {
		self.unknown.as_deref()
	}

	/// Resolves `symbol` to its known child, or to the unknown bucket.
	pub fn resolve(&self, symbol: &S) -> Option<Child<'_, S>> {
		if let Some(child) = self.children.get(symbol) {
			return Some(Child::Known(child));
		}
		self.unknown.as_deref().map(Child::UnknownBucket)
	}

	/// Adds `height` symbols of `symbols`, starting at `index`, as a path
	/// below this node. Every node on the path gains `multiplier` occurrences.
	///
	/// Missing nodes are created on demand. The walk stops early if the
	/// sequence runs out of symbols.
	pub fn add_path(&mut self, symbols: &[S], index: usize, height: usize, multiplier: usize) {
		if height == 0 {
			return;
		}
		let Some(symbol) = symbols.get(index) else {
			return;
		};

		let child = self.children.entry(symbol.clone()).or_default();
		child.count += multiplier;
		child.add_path(symbols, index + 1, height - 1, multiplier);
	}

	/// Count stored at the node reached by following `symbols[index..]`.
	///
	/// Returns 0 as soon as a link on the path is missing.
	pub fn count_path(&self, symbols: &[S], index: usize) -> usize {
		match symbols.get(index) {
			None => self.count,
			Some(symbol) => self
				.children
				.get(symbol)
				.map_or(0, |child| child.count_path(symbols, index + 1)),
		}
	}

	/// Largest count among the descendants exactly `height` levels below.
	///
	/// `height == 0` returns this node's own count.
	pub fn max_occurrence(&self, height: usize) -> usize {
		if height == 0 {
			return self.count;
		}
		self.children
			.values()
			.map(|child| child.max_occurrence(height - 1))
			.max()
			.unwrap_or(0)
	}

	/// Sum of the counts of the children, unknown bucket included.
	fn child_sum(&self) -> f64 {
		let known: usize = self.children.values().map(|child| child.count).sum();
		let unknown = self.unknown.as_ref().map_or(0, |bucket| bucket.count);
		(known + unknown) as f64
	}

	/// Increments `counts_of_counts[r]` for every descendant `height` levels
	/// below whose count is `r`.
	///
	/// The table must be longer than the largest count at that depth.
	pub fn update_counts_of_counts(&self, counts_of_counts: &mut [usize], height: usize) {
		if height == 0 {
			if let Some(slot) = counts_of_counts.get_mut(self.count) {
				*slot += 1;
			}
			return;
		}
		for child in self.children.values() {
			child.update_counts_of_counts(counts_of_counts, height - 1);
		}
	}

	/// Visits the nodes that own the children at the target depth.
	///
	/// Unknown buckets on the way are entered only when `buckets` is set.
	fn for_each_parent_at(&mut self, height: usize, buckets: bool, visit: &mut dyn FnMut(&mut NGramNode<S>)) {
		if height <= 1 {
			visit(self);
			return;
		}
		for child in self.children.values_mut() {
			child.for_each_parent_at(height - 1, buckets, visit);
		}
		if let Some(bucket) = self.unknown.as_deref_mut().filter(|_| buckets) {
			bucket.for_each_parent_at(height - 1, buckets, visit);
		}
	}

	/// Sets additive (pseudo-count) probabilities for the nodes `height`
	/// levels below this one.
	///
	/// For every child: `(count + delta) / (child_sum + delta * vocabulary_size)`.
	/// The parent's unseen probability is `delta` over the same denominator.
	pub fn set_probability_with_pseudo_count(&mut self, delta: f64, height: usize, vocabulary_size: f64) {
		self.for_each_parent_at(height, true, &mut |parent| {
			let sum = parent.child_sum() + delta * vocabulary_size;
			for child in parent.children.values_mut() {
				child.probability = (child.count as f64 + delta) / sum;
			}
			if let Some(bucket) = parent.unknown.as_deref_mut() {
				bucket.probability = (bucket.count as f64 + delta) / sum;
			}
			parent.probability_of_unseen = delta / sum;
		});
	}

	/// Sets Good-Turing probabilities for the nodes `height` levels below.
	///
	/// Counts `r <= 5` are discounted to `(r + 1) * n[r + 1] / n[r]` where `n`
	/// is the smoothed counts-of-counts table; larger counts are kept. The
	/// adjusted counts are normalised to share `1 - p_zero`, and the parent's
	/// unseen probability is `p_zero / (vocabulary_size - size())`.
	///
	/// Subtrees below unknown buckets are left untouched: their counts are
	/// not part of the counts-of-counts table.
	///
	/// # Errors
	/// `RegressionFailed` if the table has no positive entry for a needed `r`.
	pub fn set_adjusted_probability(
		&mut self,
		n: &[f64],
		height: usize,
		vocabulary_size: f64,
		p_zero: f64,
	) -> NGramResult<()> {
		let mut failure = None;
		self.for_each_parent_at(height, false, &mut |parent| {
			if failure.is_some() {
				return;
			}
			let mut adjusted = Vec::with_capacity(parent.children.len());
			for child in parent.children.values() {
				match adjusted_count(n, child.count) {
					Ok(r) => adjusted.push(r),
					Err(e) => {
						failure = Some(e);
						return;
					}
				}
			}
			let sum: f64 = adjusted.iter().sum();
			for (child, r) in parent.children.values_mut().zip(adjusted) {
				child.probability = (1.0 - p_zero) * (r / sum);
			}
			parent.probability_of_unseen = p_zero / (vocabulary_size - parent.children.len() as f64);
		});
		failure.map_or(Ok(()), Err)
	}

	/// Probability of the last symbol of `path` given the preceding ones,
	/// read from the trie below this node.
	///
	/// The last symbol falls back to the unknown bucket, then to this level's
	/// unseen probability. Returns `None` when a context symbol resolves to
	/// nothing: the sequence is unseen and the caller picks the fallback.
	pub fn path_probability(&self, path: &[S]) -> Option<f64> {
		match path {
			[] => None,
			[symbol] => Some(
				self.resolve(symbol)
					.map_or(self.probability_of_unseen, |child| child.node().probability),
			),
			[first, rest @ ..] => self.resolve(first)?.node().path_probability(rest),
		}
	}

	/// Adds the counts of the nodes `height` levels below to `counter`,
	/// keyed by their symbol.
	pub fn count_words(&self, counter: &mut HashMap<S, usize>, height: usize) {
		match height {
			0 => {}
			1 => {
				for (symbol, child) in &self.children {
					*counter.entry(symbol.clone()).or_insert(0) += child.count;
				}
			}
			_ => {
				for child in self.children.values() {
					child.count_words(counter, height - 1);
				}
			}
		}
	}

	/// Moves every child whose symbol is not in `dictionary` into the
	/// unknown bucket, then repeats the replacement below.
	///
	/// The bucket's count is the sum of the removed counts and its children
	/// are the union of the removed children's children.
	pub fn replace_unknown_words(&mut self, dictionary: &HashSet<S>) {
		if self.children.is_empty() {
			return;
		}

		let unknown_symbols: Vec<S> = self
			.children
			.keys()
			.filter(|symbol| !dictionary.contains(*symbol))
			.cloned()
			.collect();

		if !unknown_symbols.is_empty() {
			let mut bucket = self.unknown.take().map_or_else(NGramNode::new, |bucket| *bucket);
			for symbol in unknown_symbols {
				if let Some(removed) = self.children.remove(&symbol) {
					bucket.count += removed.count;
					for (grandchild_symbol, grandchild) in removed.children {
						match bucket.children.entry(grandchild_symbol) {
							Entry::Occupied(mut existing) => existing.get_mut().absorb(grandchild),
							Entry::Vacant(slot) => {
								slot.insert(grandchild);
							}
						}
					}
				}
			}
			bucket.replace_unknown_words(dictionary);
			self.unknown = Some(Box::new(bucket));
		}

		for child in self.children.values_mut() {
			child.replace_unknown_words(dictionary);
		}
	}

	/// Removes, `levels` levels below, every child whose relative frequency
	/// `count / parent.count` is under `threshold`.
	///
	/// The highest-count child always survives, so a parent that had
	/// children keeps at least one. Among tied counts the smallest symbol wins.
	pub fn prune(&mut self, threshold: f64, levels: usize)
	where
		S: Ord,
	{
		if levels > 0 {
			for child in self.children.values_mut() {
				child.prune(threshold, levels - 1);
			}
			return;
		}

		let strongest = self
			.children
			.iter()
			.max_by(|a, b| a.1.count.cmp(&b.1.count).then_with(|| b.0.cmp(a.0)))
			.map(|(symbol, _)| symbol.clone());
		let parent_count = self.count as f64;
		self.children.retain(|symbol, child| {
			Some(symbol) == strongest.as_ref() || child.count as f64 / parent_count >= threshold
		});
	}

	/// Adds the counts of `other` into this node, recursively.
	///
	/// Subtrees that only exist in `other` are copied.
	pub fn merge(&mut self, other: &Self) {
		self.count += other.count;
		for (symbol, other_child) in &other.children {
			match self.children.get_mut(symbol) {
				Some(child) => child.merge(other_child),
				None => {
					self.children.insert(symbol.clone(), other_child.clone());
				}
			}
		}
		if let Some(other_bucket) = other.unknown.as_deref() {
			match self.unknown.as_deref_mut() {
				Some(bucket) => bucket.merge(other_bucket),
				None => self.unknown = Some(Box::new(other_bucket.clone())),
			}
		}
	}

	/// Same as `merge`, but takes ownership and moves subtrees instead of copying.
	fn absorb(&mut self, other: Self) {
		self.count += other.count;
		for (symbol, other_child) in other.children {
			match self.children.entry(symbol) {
				Entry::Occupied(mut child) => child.get_mut().absorb(other_child),
				Entry::Vacant(slot) => {
					slot.insert(other_child);
				}
			}
		}
		if let Some(other_bucket) = other.unknown {
			match self.unknown.as_deref_mut() {
				Some(bucket) => bucket.absorb(*other_bucket),
				None => self.unknown = Some(other_bucket),
			}
		}
	}

	/// Draws the symbol following `context` using the stored probabilities.
	///
	/// Children are scanned in ascending symbol order so a seeded `rng`
	/// always yields the same symbol. Returns `None` if the context is not in
	/// the trie, or if the draw lands in the unseen mass.
	pub fn generate_next_symbol<R>(&self, context: &[S], rng: &mut R) -> Option<S>
	where
		S: Ord,
		R: Rng + ?Sized,
	{
		if let Some((first, rest)) = context.split_first() {
			return self.children.get(first)?.generate_next_symbol(rest, rng);
		}

		let draw: f64 = rng.random();
		let mut candidates: Vec<(&S, &NGramNode<S>)> = self.children.iter().collect();
		candidates.sort_by(|a, b| a.0.cmp(b.0));

		let mut cumulative = 0.0;
		for (symbol, child) in candidates {
			if draw < cumulative + child.probability {
				return Some(symbol.clone());
			}
			cumulative += child.probability;
		}
		None
	}

	/// Writes this node and its subtree in the text model format.
	///
	/// The node's own line is `count probability probability_of_unseen size`,
	/// indented by `level` tabs. Each child follows as its symbol line and
	/// its own subtree, one tab deeper. Children are written in ascending
	/// encoded order; the unknown bucket is not written.
	pub(crate) fn write_text<W, C>(&self, writer: &mut W, codec: &C, level: usize) -> io::Result<()>
	where
		W: Write,
		C: SymbolCodec<S> + ?Sized,
	{
		let indent = "\t".repeat(level);
		writeln!(
			writer,
			"{indent}{} {} {} {}",
			self.count,
			self.probability,
			self.probability_of_unseen,
			self.children.len()
		)?;

		let mut children: Vec<(String, &NGramNode<S>)> = self
			.children
			.iter()
			.map(|(symbol, child)| (codec.encode(symbol), child))
			.collect();
		children.sort_by(|a, b| a.0.cmp(&b.0));

		for (symbol, child) in children {
			writeln!(writer, "{indent}\t{symbol}")?;
			child.write_text(writer, codec, level + 1)?;
		}
		Ok(())
	}

	/// Reads a node and its subtree written by `write_text`.
	///
	/// # Errors
	/// Any malformed or missing line is fatal.
	pub(crate) fn read_text<I, C>(reader: &mut LineReader<I>, codec: &C) -> NGramResult<Self>
	where
		I: Iterator<Item = io::Result<String>>,
		C: SymbolCodec<S> + ?Sized,
	{
		let line = reader.next_line()?;
		let items: Vec<&str> = line.split_whitespace().collect();
		let &[count, probability, probability_of_unseen, size] = items.as_slice() else {
			return Err(reader.error(format!("expected 4 node fields, found {}", items.len())));
		};

		let size: usize = reader.parse_field(size, "child count")?;
		let mut node = Self {
			count: reader.parse_field(count, "count")?,
			probability: reader.parse_field(probability, "probability")?,
			probability_of_unseen: reader.parse_field(probability_of_unseen, "unseen probability")?,
			children: HashMap::with_capacity(size),
			unknown: None,
		};

		for _ in 0..size {
			let symbol_line = reader.next_line()?;
			let symbol = codec.decode(symbol_line.trim())?;
			let child = Self::read_text(reader, codec)?;
			node.children.insert(symbol, child);
		}
		Ok(node)
	}
}

/// Good-Turing adjusted count for raw count `r`.
fn adjusted_count(n: &[f64], r: usize) -> NGramResult<f64> {
	if r > GOOD_TURING_MAX_DISCOUNTED_COUNT {
		return Ok(r as f64);
	}
	match (n.get(r), n.get(r + 1)) {
		(Some(&n_r), Some(&n_next)) if n_r > 0.0 => Ok((r + 1) as f64 * n_next / n_r),
		_ => Err(NGramError::RegressionFailed(format!(
			"no positive smoothed count of counts for r = {r}"
		))),
	}
}
