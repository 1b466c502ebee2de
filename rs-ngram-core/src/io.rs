use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{fs, io};

use crate::error::{NGramError, NGramResult};

/// Reads a whitespace-tokenized corpus: one sentence per line.
///
/// - Reads the entire file into memory
/// - Blank lines are skipped
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<Vec<Vec<String>>> {
	let contents = fs::read_to_string(filename)?;
	Ok(parse_corpus(&contents))
}

/// Splits text into sentences (lines) of whitespace-separated symbols.
pub fn parse_corpus(text: &str) -> Vec<Vec<String>> {
	text.lines()
		.map(|line| line.split_whitespace().map(str::to_owned).collect::<Vec<_>>())
		.filter(|sentence| !sentence.is_empty())
		.collect()
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/model.ngram` + `"bin"` → `data/model.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Lists all files with a given extension in a directory.
///
/// Returns file stems only (no paths, no extension), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(stem) = path.file_stem() {
				files.push(stem.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Reads the lines of several files as one logical file.
///
/// When file `i` is exhausted, reading continues transparently with the
/// first line of file `i + 1`. Line boundaries of each part are kept, so
/// a part that does not end with a newline is not glued to the next one.
pub struct MultipleFile {
	paths: Vec<PathBuf>,
	index: usize,
	current: Option<Lines<BufReader<File>>>,
}

impl MultipleFile {
	/// Opens the first part; later parts are opened lazily.
	pub fn new<P: AsRef<Path>>(paths: &[P]) -> io::Result<Self> {
		let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
		let current = match paths.first() {
			Some(first) => Some(BufReader::new(File::open(first)?).lines()),
			None => None,
		};
		Ok(Self { paths, index: 0, current })
	}
}

impl Iterator for MultipleFile {
	type Item = io::Result<String>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(line) = self.current.as_mut()?.next() {
				return Some(line);
			}
			self.index += 1;
			let path = self.paths.get(self.index)?;
			match File::open(path) {
				Ok(file) => self.current = Some(BufReader::new(file).lines()),
				Err(e) => {
					self.current = None;
					return Some(Err(e));
				}
			}
		}
	}
}

/// Line source for the text model parser, tracking the line number
/// for error reports.
pub(crate) struct LineReader<I> {
	lines: I,
	line_number: usize,
}

impl<I: Iterator<Item = io::Result<String>>> LineReader<I> {
	pub(crate) fn new(lines: I) -> Self {
		Self { lines, line_number: 0 }
	}

	/// Next line; running out of lines is an error.
	pub(crate) fn next_line(&mut self) -> NGramResult<String> {
		match self.lines.next() {
			Some(line) => {
				self.line_number += 1;
				Ok(line?)
			}
			None => Err(NGramError::UnexpectedEof(self.line_number)),
		}
	}

	/// A parse error located at the current line.
	pub(crate) fn error(&self, message: impl Into<String>) -> NGramError {
		NGramError::Parse {
			line: self.line_number,
			message: message.into(),
		}
	}

	/// Parses one field of the current line.
	pub(crate) fn parse_field<T: FromStr>(&self, field: &str, name: &str) -> NGramResult<T> {
		field
			.parse::<T>()
			.map_err(|_| self.error(format!("invalid {name}: {field:?}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_parse_corpus() {
		let corpus = parse_corpus("<s> ali topu at </s>\n\n  <s> ayşe </s>  \n");
		assert_eq!(corpus.len(), 2);
		assert_eq!(corpus[0], vec!["<s>", "ali", "topu", "at", "</s>"]);
		assert_eq!(corpus[1], vec!["<s>", "ayşe", "</s>"]);
	}

	#[test]
	fn test_read_corpus() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, "<s> ali topu at </s>\n<s> ayşe </s>\n").unwrap();
		let corpus = read_corpus(&path).unwrap();
		assert_eq!(corpus, vec![vec!["<s>", "ali", "topu", "at", "</s>"], vec!["<s>", "ayşe", "</s>"]]);
		assert!(read_corpus(dir.path().join("missing.txt")).is_err());
	}

	#[test]
	fn test_build_output_path() {
		let path = build_output_path("data/model.ngram", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/model.bin"));
	}

	#[test]
	fn test_multiple_file_concatenates_lines() {
		let dir = tempfile::tempdir().unwrap();
		let first = dir.path().join("part1.txt");
		let second = dir.path().join("part2.txt");
		fs::File::create(&first).unwrap().write_all(b"one\ntwo").unwrap();
		fs::File::create(&second).unwrap().write_all(b"three\nfour\n").unwrap();

		let lines: Vec<String> = MultipleFile::new(&[&first, &second])
			.unwrap()
			.collect::<io::Result<_>>()
			.unwrap();
		assert_eq!(lines, vec!["one", "two", "three", "four"]);
	}

	#[test]
	fn test_multiple_file_reports_missing_part() {
		let dir = tempfile::tempdir().unwrap();
		let first = dir.path().join("part1.txt");
		fs::write(&first, "one\n").unwrap();
		let missing = dir.path().join("missing.txt");

		let mut reader = MultipleFile::new(&[&first, &missing]).unwrap();
		assert_eq!(reader.next().unwrap().unwrap(), "one");
		assert!(reader.next().unwrap().is_err());
		assert!(reader.next().is_none());
	}

	#[test]
	fn test_list_files() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.ngram"), "").unwrap();
		fs::write(dir.path().join("a.ngram"), "").unwrap();
		fs::write(dir.path().join("a.bin"), "").unwrap();
		assert_eq!(list_files(dir.path(), "ngram").unwrap(), vec!["a", "b"]);
	}
}
