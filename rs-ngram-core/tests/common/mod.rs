#![allow(dead_code)]

use rs_ngram_core::NGramModel;

/// Five tokenized Turkish sentences; 15 distinct symbols.
pub const SENTENCES: [&str; 5] = [
	"<s> ali topu at mehmet ayşeye gitti </s>",
	"<s> ali top at ayşe eve gitti </s>",
	"<s> ayşe kitabı ver </s>",
	"<s> ali topu mehmete at </s>",
	"<s> ali topu at mehmet ayşeyle gitti </s>",
];

pub fn corpus() -> Vec<Vec<String>> {
	SENTENCES
		.iter()
		.map(|line| line.split_whitespace().map(str::to_owned).collect())
		.collect()
}

pub fn words(text: &str) -> Vec<String> {
	text.split_whitespace().map(str::to_owned).collect()
}

pub fn model(n: usize) -> NGramModel<String> {
	NGramModel::from_corpus(&corpus(), n).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
	assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
}
