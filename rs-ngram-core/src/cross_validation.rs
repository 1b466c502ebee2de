//! Train/test partitioning of a corpus for hyperparameter search.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// A source of train/test fold pairs.
pub trait CrossValidation<T> {
	/// Number of folds.
	fn fold_count(&self) -> usize;

	/// Items used to train the model of fold `k`.
	fn train_fold(&self, k: usize) -> Vec<T>;

	/// Held-out items used to evaluate the model of fold `k`.
	fn test_fold(&self, k: usize) -> Vec<T>;
}

/// K-fold cross-validation over a shuffled copy of the corpus.
///
/// The test fold `k` is the slice `[k * len / K, (k + 1) * len / K)` of the
/// shuffled items; its train fold is every other item, in order. The
/// shuffle is seeded so the folds are reproducible.
#[derive(Debug, Clone)]
pub struct KFoldCrossValidation<T> {
	instances: Vec<T>,
	k: usize,
}

impl<T: Clone> KFoldCrossValidation<T> {
	/// Shuffles `instances` with `seed` and splits them into `k` folds.
	pub fn new(instances: &[T], k: usize, seed: u64) -> Self {
		let mut instances = instances.to_vec();
		instances.shuffle(&mut StdRng::seed_from_u64(seed));
		Self { instances, k }
	}

	fn bounds(&self, fold: usize) -> (usize, usize) {
		let len = self.instances.len();
		(fold * len / self.k, (fold + 1) * len / self.k)
	}
}

impl<T: Clone> CrossValidation<T> for KFoldCrossValidation<T> {
	fn fold_count(&self) -> usize {
		self.k
	}

	fn train_fold(&self, k: usize) -> Vec<T> {
		let (start, end) = self.bounds(k);
		self.instances[..start]
			.iter()
			.chain(&self.instances[end..])
			.cloned()
			.collect()
	}

	fn test_fold(&self, k: usize) -> Vec<T> {
		let (start, end) = self.bounds(k);
		self.instances[start..end].to_vec()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_folds_partition_the_corpus() {
		let items: Vec<u32> = (0..23).collect();
		let folds = KFoldCrossValidation::new(&items, 10, 0);
		assert_eq!(folds.fold_count(), 10);

		let mut seen = Vec::new();
		for k in 0..10 {
			let test = folds.test_fold(k);
			let train = folds.train_fold(k);
			assert_eq!(test.len() + train.len(), items.len());
			assert!(test.iter().all(|item| !train.contains(item)));
			seen.extend(test);
		}
		seen.sort();
		assert_eq!(seen, items);
	}

	#[test]
	fn test_shuffle_is_seeded() {
		let items: Vec<u32> = (0..50).collect();
		let a = KFoldCrossValidation::new(&items, 5, 42);
		let b = KFoldCrossValidation::new(&items, 5, 42);
		for k in 0..5 {
			assert_eq!(a.test_fold(k), b.test_fold(k));
		}
	}

	#[test]
	fn test_more_folds_than_items() {
		let items = vec!["a", "b", "c"];
		let folds = KFoldCrossValidation::new(&items, 10, 0);
		let non_empty = (0..10).filter(|&k| !folds.test_fold(k).is_empty()).count();
		assert_eq!(non_empty, 3);
		assert_eq!(folds.train_fold(0).len(), 3);
	}
}
