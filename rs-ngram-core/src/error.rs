//! # Error Types

/// Errors from n-gram model operations.
#[derive(Debug, thiserror::Error)]
pub enum NGramError {
	/// I/O error.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// A persisted model line could not be parsed.
	#[error("parse error at line {line}: {message}")]
	Parse {
		/// 1-based line number in the logical (possibly multi-part) file.
		line: usize,
		/// What was wrong with the line.
		message: String,
	},

	/// The persisted model ended before the header or the trie was complete.
	#[error("unexpected end of model file after line {0}")]
	UnexpectedEof(usize),

	/// A symbol could not be decoded from its text form.
	#[error("invalid symbol: {0}")]
	Symbol(String),

	/// The Good-Turing counts-of-counts regression could not be solved.
	#[error("counts-of-counts regression failed: {0}")]
	RegressionFailed(String),

	/// Model order must be at least 1.
	#[error("invalid n-gram order: {0}")]
	InvalidOrder(usize),

	/// A probability level outside `1..=order`.
	#[error("level {level} is outside 1..={order}")]
	InvalidLevel {
		/// Requested level.
		level: usize,
		/// Order of the model.
		order: usize,
	},

	/// Binary snapshot (de)serialization error.
	#[error("snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),

	/// Invalid options.
	#[error("invalid configuration: {0}")]
	Config(String),
}

/// Result type for n-gram operations.
pub type NGramResult<T> = Result<T, NGramError>;
