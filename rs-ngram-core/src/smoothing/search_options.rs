use crate::error::{NGramError, NGramResult};

/// Default number of cross-validation folds.
pub const DEFAULT_FOLDS: usize = 10;

/// Default number of grid intervals; `parts + 1` points are evaluated.
pub const DEFAULT_NUMBER_OF_PARTS: usize = 5;

/// Default relative change of the best objective that ends the search.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Default cap on grid refinements.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Options of the cross-validated grid search run by trained smoothing.
///
/// ## Invariants
/// Enforced by [`validate`](Self::validate):
/// - `folds >= 2`
/// - `number_of_parts >= 1`
/// - `tolerance > 0`
/// - `max_iterations >= 1`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
	folds: usize,
	number_of_parts: usize,
	tolerance: f64,
	max_iterations: usize,
	seed: u64,
	threads: usize,
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self {
			folds: DEFAULT_FOLDS,
			number_of_parts: DEFAULT_NUMBER_OF_PARTS,
			tolerance: DEFAULT_TOLERANCE,
			max_iterations: DEFAULT_MAX_ITERATIONS,
			seed: 0,
			threads: num_cpus::get(),
		}
	}
}

impl SearchOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of cross-validation folds, and of fold models.
	pub fn folds(&self) -> usize {
		self.folds
	}

	pub fn with_folds(mut self, folds: usize) -> Self {
		self.folds = folds;
		self
	}

	/// Number of intervals the current bounds are split into.
	pub fn number_of_parts(&self) -> usize {
		self.number_of_parts
	}

	pub fn with_number_of_parts(mut self, number_of_parts: usize) -> Self {
		self.number_of_parts = number_of_parts;
		self
	}

	/// Stop once `|previous - best| / best` falls below this value.
	pub fn tolerance(&self) -> f64 {
		self.tolerance
	}

	pub fn with_tolerance(mut self, tolerance: f64) -> Self {
		self.tolerance = tolerance;
		self
	}

	/// Hard cap on refinements, whatever the objective does.
	pub fn max_iterations(&self) -> usize {
		self.max_iterations
	}

	pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
		self.max_iterations = max_iterations;
		self
	}

	/// Seed of the fold shuffle.
	pub fn seed(&self) -> u64 {
		self.seed
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = seed;
		self
	}

	/// Worker threads used to train the fold models (`0` is read as 1).
	pub fn threads(&self) -> usize {
		self.threads.max(1)
	}

	pub fn with_threads(mut self, threads: usize) -> Self {
		self.threads = threads;
		self
	}

	/// Checks the invariants.
	///
	/// # Errors
	/// `Config` naming the first offending option.
	pub fn validate(&self) -> NGramResult<()> {
		if self.folds < 2 {
			return Err(NGramError::Config(format!("folds must be >= 2, got {}", self.folds)));
		}
		if self.number_of_parts == 0 {
			return Err(NGramError::Config("number_of_parts must be >= 1".to_owned()));
		}
		if !(self.tolerance > 0.0) {
			return Err(NGramError::Config(format!("tolerance must be > 0, got {}", self.tolerance)));
		}
		if self.max_iterations == 0 {
			return Err(NGramError::Config("max_iterations must be >= 1".to_owned()));
		}
		Ok(())
	}
}
