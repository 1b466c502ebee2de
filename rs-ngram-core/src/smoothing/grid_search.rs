//! Shrinking grid search.
//!
//! Each iteration evaluates the objective at `parts + 1` evenly spaced
//! points of the current bounds, keeps the first point with the lowest
//! value, then narrows the bounds around it. The search ends when the best
//! value changes by less than the relative tolerance between two iterations.

use log::{debug, warn};

use super::search_options::SearchOptions;
use crate::error::NGramResult;

/// Closed search interval of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
	lower: f64,
	upper: f64,
}

impl Bounds {
	/// The `parts + 1` grid points; both ends are hit exactly.
	fn candidates(self, parts: usize) -> impl Iterator<Item = f64> {
		let step = (self.upper - self.lower) / parts as f64;
		(0..=parts).map(move |i| if i == parts { self.upper } else { self.lower + i as f64 * step })
	}

	/// Narrows the bounds around `best`.
	///
	/// A best value on the lower edge divides the lower bound by `parts`
	/// instead of stepping below it. The new upper bound uses the span from
	/// the new lower bound and never exceeds `cap`.
	fn shrink(self, best: f64, parts: usize, cap: f64) -> Self {
		let parts = parts as f64;
		let lower = if best != self.lower {
			best - (self.upper - self.lower) / parts
		} else {
			best / parts
		};
		let upper = if best != self.upper {
			best + (self.upper - lower) / parts
		} else {
			best * parts
		};
		Self { lower, upper: upper.min(cap) }
	}
}

/// Whether the search should stop after an iteration whose best objective
/// is `best`, the previous one being `previous`.
fn converged(previous: Option<f64>, best: f64, tolerance: f64) -> bool {
	if !best.is_finite() || best == 0.0 {
		warn!("grid search stopped on a degenerate objective ({best})");
		return true;
	}
	previous.is_some_and(|previous| (previous - best).abs() / best < tolerance)
}

/// Minimizes `objective` over `[lower, upper]`.
///
/// The returned value always lies within `[0, upper]`.
///
/// # Errors
/// The first error returned by `objective`.
pub fn minimize_1d<F>(lower: f64, upper: f64, options: &SearchOptions, mut objective: F) -> NGramResult<f64>
where
	F: FnMut(f64) -> NGramResult<f64>,
{
	let parts = options.number_of_parts();
	let mut bounds = Bounds { lower, upper };
	let mut best_value = (lower + upper) / 2.0;
	let mut previous = None;

	for iteration in 0..options.max_iterations() {
		let mut best_objective = f64::INFINITY;
		for value in bounds.candidates(parts) {
			let score = objective(value)?;
			if score < best_objective {
				best_objective = score;
				best_value = value;
			}
		}
		debug!(
			"iteration {iteration}: bounds [{}, {}], best {best_value} ({best_objective})",
			bounds.lower, bounds.upper
		);

		bounds = bounds.shrink(best_value, parts, upper);
		if converged(previous, best_objective, options.tolerance()) {
			return Ok(best_value);
		}
		previous = Some(best_objective);
	}

	warn!("grid search hit {} iterations without converging", options.max_iterations());
	Ok(best_value)
}

/// Minimizes `objective` over pairs `(v1, v2)` with both values in
/// `[lower, upper]` for their own lower bound and `v1 + v2 < 1`.
///
/// For each `v1`, the inner grid stops at the first `v2` breaking the sum
/// constraint. Both bounds shrink independently.
///
/// # Errors
/// The first error returned by `objective`.
pub fn minimize_2d<F>(
	lower1: f64,
	lower2: f64,
	upper: f64,
	options: &SearchOptions,
	mut objective: F,
) -> NGramResult<(f64, f64)>
where
	F: FnMut(f64, f64) -> NGramResult<f64>,
{
	let parts = options.number_of_parts();
	let mut bounds1 = Bounds { lower: lower1, upper };
	let mut bounds2 = Bounds { lower: lower2, upper };
	let mut best = ((lower1 + upper) / 2.0, (lower2 + upper) / 2.0);
	let mut previous = None;

	for iteration in 0..options.max_iterations() {
		let mut best_objective = f64::INFINITY;
		for value1 in bounds1.candidates(parts) {
			for value2 in bounds2.candidates(parts).take_while(|value2| value1 + value2 < 1.0) {
				let score = objective(value1, value2)?;
				if score < best_objective {
					best_objective = score;
					best = (value1, value2);
				}
			}
		}
		debug!(
			"iteration {iteration}: bounds [{}, {}] x [{}, {}], best {best:?} ({best_objective})",
			bounds1.lower, bounds1.upper, bounds2.lower, bounds2.upper
		);

		bounds1 = bounds1.shrink(best.0, parts, upper);
		bounds2 = bounds2.shrink(best.1, parts, upper);
		if converged(previous, best_objective, options.tolerance()) {
			return Ok(best);
		}
		previous = Some(best_objective);
	}

	warn!("grid search hit {} iterations without converging", options.max_iterations());
	Ok(best)
}
