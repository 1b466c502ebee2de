use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::{NGramError, NGramResult};

/// Anything that can label a trie edge.
///
/// Blanket-implemented; the `Send + Sync` bounds allow fold models to be
/// trained on worker threads during hyperparameter search.
pub trait Symbol: Clone + Eq + Hash + Send + Sync {}

impl<T: Clone + Eq + Hash + Send + Sync> Symbol for T {}

/// Converts symbols to and from the single-line text form used by
/// the persisted model format.
///
/// # Invariants
/// - `decode(&encode(s)) == s` for every symbol the model may hold
/// - Encoded text contains no newline and no leading/trailing whitespace
pub trait SymbolCodec<S> {
	/// Text form of `symbol`.
	fn encode(&self, symbol: &S) -> String;

	/// Parses a symbol back from its text form.
	fn decode(&self, text: &str) -> NGramResult<S>;
}

/// Codec for any symbol type with a `Display`/`FromStr` pair
/// (`String`, `char`, integers, ...).
pub struct TextCodec<S> {
	_marker: PhantomData<fn() -> S>,
}

impl<S> TextCodec<S> {
	pub fn new() -> Self {
		Self { _marker: PhantomData }
	}
}

impl<S> Default for TextCodec<S> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S> SymbolCodec<S> for TextCodec<S>
where
	S: Display + FromStr,
	S::Err: Display,
{
	fn encode(&self, symbol: &S) -> String {
		symbol.to_string()
	}

	fn decode(&self, text: &str) -> NGramResult<S> {
		text.parse::<S>()
			.map_err(|e| NGramError::Symbol(format!("{text:?}: {e}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_text_codec_string() {
		let codec = TextCodec::<String>::new();
		let word = "ayşeye".to_string();
		assert_eq!(codec.encode(&word), "ayşeye");
		assert_eq!(codec.decode("ayşeye").unwrap(), word);
	}

	#[test]
	fn test_text_codec_char() {
		let codec = TextCodec::<char>::new();
		assert_eq!(codec.encode(&'ş'), "ş");
		assert_eq!(codec.decode("ş").unwrap(), 'ş');
		assert!(matches!(codec.decode("ab"), Err(NGramError::Symbol(_))));
	}

	#[test]
	fn test_text_codec_integer() {
		let codec = TextCodec::<u32>::new();
		assert_eq!(codec.decode(&codec.encode(&42)).unwrap(), 42);
		assert!(codec.decode("forty-two").is_err());
	}
}
