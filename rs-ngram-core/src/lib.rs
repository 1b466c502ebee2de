//! N-gram language modelling library.
//!
//! This crate provides:
//! - N-gram models of any symbol type, backed by a count trie
//! - Smoothing strategies: none, additive/Laplace, Good-Turing, interpolation
//! - Hyperparameter learning by k-fold cross-validation and grid search
//! - Text persistence (single or multi-part files) and binary snapshots
//! - Sequence generation with an injected random source

/// Crate-wide error type.
pub mod error;

/// Trie, model facade, symbols and generation.
pub mod model;

/// Smoothing strategies and the hyperparameter learner.
pub mod smoothing;

/// Train/test fold partitioning.
pub mod cross_validation;

/// I/O utilities (corpus reading, multi-part files, path helpers).
pub mod io;

pub use error::{NGramError, NGramResult};
pub use model::generator::{Generator, StartSeed};
pub use model::ngram_model::NGramModel;
pub use model::ngram_node::{Child, NGramNode};
pub use model::symbol::{Symbol, SymbolCodec, TextCodec};
