mod common;

use std::fs;

use common::{corpus, model};
use rs_ngram_core::smoothing::{GoodTuringSmoothing, InterpolatedSmoothing, LaplaceSmoothing};
use rs_ngram_core::{NGramError, NGramModel, TextCodec};

fn assert_same_model(a: &NGramModel<String>, b: &NGramModel<String>) {
	assert_eq!(a.order(), b.order());
	assert_eq!(a.vocabulary(), b.vocabulary());
	assert_eq!(a.lambdas(), b.lambdas());
	assert_eq!(a.is_interpolated(), b.is_interpolated());
	for level in 1..=a.order() {
		assert_eq!(a.unseen_probability(level), b.unseen_probability(level));
	}
	for sentence in corpus() {
		for window in sentence.windows(a.order()) {
			assert_eq!(a.count(window), b.count(window));
			assert!((a.probability(window) - b.probability(window)).abs() < 1e-9);
		}
	}
	assert!((a.perplexity(&corpus()) - b.perplexity(&corpus())).abs() < 1e-9);
}

#[test]
fn test_save_then_load() {
	let dir = tempfile::tempdir().unwrap();
	let codec = TextCodec::<String>::new();

	for n in 1..=3 {
		let mut original = model(n);
		original.compute_probabilities(&GoodTuringSmoothing).unwrap();
		let path = dir.path().join(format!("model{n}.txt"));
		original.save(&path, &codec).unwrap();

		let loaded = NGramModel::<String>::load(&path, &codec).unwrap();
		assert_same_model(&original, &loaded);
	}
}

#[test]
fn test_saved_file_is_reproducible() {
	let dir = tempfile::tempdir().unwrap();
	let codec = TextCodec::<String>::new();
	let first = dir.path().join("first.txt");
	let second = dir.path().join("second.txt");

	let mut model = model(2);
	model.compute_probabilities(&LaplaceSmoothing::new()).unwrap();
	model.save(&first, &codec).unwrap();
	NGramModel::<String>::load(&first, &codec)
		.unwrap()
		.save(&second, &codec)
		.unwrap();

	let text = fs::read_to_string(&first).unwrap();
	assert_eq!(text, fs::read_to_string(&second).unwrap());
	let mut lines = text.lines();
	assert_eq!(lines.next(), Some("2 0 0"));
	assert_eq!(lines.next(), Some("0 0.0625"));
	assert_eq!(lines.next(), Some("15"));
	assert_eq!(lines.next(), Some("</s>"));
}

#[test]
fn test_interpolated_model_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let codec = TextCodec::<String>::new();
	let path = dir.path().join("interpolated.txt");

	let mut original = model(3);
	original
		.compute_probabilities(&InterpolatedSmoothing::with_inner(LaplaceSmoothing::new()))
		.unwrap();
	original.set_lambdas(0.6, 0.3);
	original.save(&path, &codec).unwrap();

	let loaded = NGramModel::<String>::load(&path, &codec).unwrap();
	assert_same_model(&original, &loaded);
}

#[test]
fn test_load_multi_part_file() {
	let dir = tempfile::tempdir().unwrap();
	let codec = TextCodec::<String>::new();
	let whole = dir.path().join("whole.txt");

	let mut original = model(3);
	original.compute_probabilities(&GoodTuringSmoothing).unwrap();
	original.save(&whole, &codec).unwrap();

	let text = fs::read_to_string(&whole).unwrap();
	let lines: Vec<&str> = text.lines().collect();
	let parts: Vec<_> = lines
		.chunks(lines.len() / 3 + 1)
		.enumerate()
		.map(|(i, chunk)| {
			let path = dir.path().join(format!("part{i}.txt"));
			fs::write(&path, chunk.join("\n")).unwrap();
			path
		})
		.collect();
	assert_eq!(parts.len(), 3);

	let loaded = NGramModel::<String>::load_multi(&parts, &codec).unwrap();
	assert_same_model(&original, &loaded);
}

#[test]
fn test_truncated_file_is_rejected() {
	let dir = tempfile::tempdir().unwrap();
	let codec = TextCodec::<String>::new();
	let path = dir.path().join("model.txt");
	model(2).save(&path, &codec).unwrap();

	let text = fs::read_to_string(&path).unwrap();
	let lines: Vec<&str> = text.lines().collect();
	fs::write(&path, lines[..lines.len() - 3].join("\n")).unwrap();
	assert!(matches!(
		NGramModel::<String>::load(&path, &codec),
		Err(NGramError::UnexpectedEof(_))
	));

	fs::write(&path, text.replacen("\n15\n", "\nfifteen\n", 1)).unwrap();
	assert!(matches!(
		NGramModel::<String>::load(&path, &codec),
		Err(NGramError::Parse { line: 3, .. })
	));
}

#[test]
fn test_char_symbols() {
	let dir = tempfile::tempdir().unwrap();
	let codec = TextCodec::<char>::new();
	let path = dir.path().join("chars.txt");
	let corpus: Vec<Vec<char>> = ["merhaba", "merak", "hava"]
		.iter()
		.map(|word| word.chars().collect())
		.collect();

	let mut original = NGramModel::from_corpus(&corpus, 2).unwrap();
	original.compute_probabilities(&LaplaceSmoothing::new()).unwrap();
	original.save(&path, &codec).unwrap();

	let loaded = NGramModel::<char>::load(&path, &codec).unwrap();
	assert_eq!(loaded.count(&['e', 'r']), 2);
	assert_eq!(loaded.probability(&['a', 'k']), original.probability(&['a', 'k']));
	assert_eq!(loaded.vocabulary_size(), 8);
}
