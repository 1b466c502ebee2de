//! Top-level module for the n-gram language model.
//!
//! This module provides:
//! - The count trie (`NGramNode`)
//! - The model facade (`NGramModel`)
//! - Symbol text conversion (`SymbolCodec`)
//! - Sequence generation (`Generator`)

/// Sequence generation from a smoothed model with a caller-supplied RNG.
pub mod generator;

/// Fixed-order n-gram model.
///
/// Handles sentence ingestion, probability and perplexity queries,
/// interpolation weights, merging and persistence.
pub mod ngram_model;

/// One node of the count trie.
///
/// Holds counts, smoothed probabilities, the unknown-symbol bucket and
/// the recursive algorithms working on them.
pub mod ngram_node;

/// Symbol bounds and the text codec used by the persisted format.
pub mod symbol;
