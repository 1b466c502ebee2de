use super::SimpleSmoothing;
use crate::error::{NGramError, NGramResult};
use crate::model::ngram_model::NGramModel;
use crate::model::symbol::Symbol;

/// Good-Turing discounting.
///
/// The counts-of-counts histogram of the level is smoothed by a log-log
/// linear fit; low counts are discounted from the fitted curve and the mass
/// freed by the discount goes to unseen n-grams.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodTuringSmoothing;

impl GoodTuringSmoothing {
	pub fn new() -> Self {
		Self
	}

	/// Fits `ln(N_r) = w1 * ln(r) + w0` on the non-zero entries of
	/// `counts_of_counts` and returns the fitted `N_r` for every index of
	/// the table (`N_0` is left at 0).
	///
	/// Each retained point `(r_i, c_i)` contributes the response
	/// - `ln(c_0)` for the first point
	/// - `ln(c_k / (r_k - r_{k-1}))` for the last point
	/// - `ln(2 c_i / (r_{i+1} - r_{i-1}))` in between
	///
	/// # Errors
	/// `RegressionFailed` when fewer than two distinct counts are present,
	/// or when the fit is not finite and positive.
	pub fn linear_regression_on_counts_of_counts(counts_of_counts: &[usize]) -> NGramResult<Vec<f64>> {
		let points: Vec<(f64, f64)> = counts_of_counts
			.iter()
			.enumerate()
			.skip(1)
			.filter(|(_, c)| **c != 0)
			.map(|(r, c)| (r as f64, *c as f64))
			.collect();

		let mut a = [[0.0; 2]; 2];
		let mut y = [0.0; 2];
		for (i, &(r, c)) in points.iter().enumerate() {
			let x = r.ln();
			let z = if i == 0 {
				c.ln()
			} else if i == points.len() - 1 {
				(c / (r - points[i - 1].0)).ln()
			} else {
				(2.0 * c / (points[i + 1].0 - points[i - 1].0)).ln()
			};
			a[0][0] += 1.0;
			a[0][1] += x;
			a[1][0] += x;
			a[1][1] += x * x;
			y[0] += z;
			y[1] += z * x;
		}

		let [w0, w1] = solve_2x2(a, y)?;
		let mut n = vec![0.0; counts_of_counts.len()];
		for (r, slot) in n.iter_mut().enumerate().skip(1) {
			*slot = ((r as f64).ln() * w1 + w0).exp();
			if !(slot.is_finite() && *slot > 0.0) {
				return Err(NGramError::RegressionFailed(format!("fitted N_{r} = {slot}")));
			}
		}
		Ok(n)
	}
}

/// Solves `a * w = y` for a 2x2 system.
fn solve_2x2(a: [[f64; 2]; 2], y: [f64; 2]) -> NGramResult<[f64; 2]> {
	let det = a[0][0] * a[1][1] - a[0][1] * a[1][0];
	if !det.is_finite() || det.abs() < 1e-12 {
		return Err(NGramError::RegressionFailed(format!(
			"singular normal equations over {} points",
			a[0][0]
		)));
	}
	Ok([
		(a[1][1] * y[0] - a[0][1] * y[1]) / det,
		(a[0][0] * y[1] - a[1][0] * y[0]) / det,
	])
}

impl<S: Symbol> SimpleSmoothing<S> for GoodTuringSmoothing {
	fn set_probabilities_at_level(&self, model: &mut NGramModel<S>, level: usize) -> NGramResult<()> {
		model.check_level(level)?;
		let counts_of_counts = model.counts_of_counts(level);
		let n = Self::linear_regression_on_counts_of_counts(&counts_of_counts)?;
		let total: usize = counts_of_counts.iter().enumerate().map(|(r, c)| r * c).sum();
		let p_zero = n[1] / total as f64;
		model.set_adjusted_probability(&n, level, p_zero)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_solve_2x2() {
		let w = solve_2x2([[2.0, 1.0], [1.0, 3.0]], [3.0, 5.0]).unwrap();
		assert!((w[0] - 0.8).abs() < 1e-12);
		assert!((w[1] - 1.4).abs() < 1e-12);
		assert!(solve_2x2([[1.0, 2.0], [2.0, 4.0]], [1.0, 1.0]).is_err());
	}

	#[test]
	fn test_regression_follows_power_law() {
		// Roughly N_r = 100 / r^2: the fitted curve must decrease.
		let n = GoodTuringSmoothing::linear_regression_on_counts_of_counts(&[0, 100, 25, 11, 6, 0]).unwrap();
		assert_eq!(n.len(), 6);
		assert_eq!(n[0], 0.0);
		assert!(n.windows(2).skip(1).all(|w| w[1] < w[0]));
		assert!(n.iter().skip(1).all(|v| *v > 0.0));
	}

	#[test]
	fn test_single_count_cannot_be_fitted() {
		assert!(matches!(
			GoodTuringSmoothing::linear_regression_on_counts_of_counts(&[0, 7, 0]),
			Err(NGramError::RegressionFailed(_))
		));
		assert!(GoodTuringSmoothing::linear_regression_on_counts_of_counts(&[0, 0]).is_err());
	}

	#[test]
	fn test_probabilities_leave_p_zero_to_unseen() {
		let corpus: Vec<Vec<String>> = ["a a a b b c", "c d e a"]
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect();
		let mut model = NGramModel::from_corpus(&corpus, 1).unwrap();
		model.compute_probabilities(&GoodTuringSmoothing).unwrap();

		let seen: f64 = model.root().children().map(|(_, child)| child.probability()).sum();
		let unseen = model.root().probability_of_unseen();
		// Every vocabulary symbol is a child here, so the unseen mass sits on one slot.
		assert!((seen + unseen - 1.0).abs() < 1e-9);
		assert_eq!(model.unseen_probability(1), Some(1.0 / 6.0));
	}

	#[test]
	fn test_unknown_words_do_not_break_the_discount() {
		let corpus: Vec<Vec<String>> = ["a b", "a b", "a c", "x d", "y d", "z d"]
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect();
		let dictionary = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
		let mut model = NGramModel::from_corpus(&corpus, 2).unwrap();
		model.replace_unknown_words(&dictionary);
		assert_eq!(model.counts_of_counts(2), vec![0, 1, 1, 0]);

		model.compute_probabilities(&GoodTuringSmoothing).unwrap();
		let a = model.root().child(&"a".to_owned()).unwrap();
		let seen: f64 = a.children().map(|(_, child)| child.probability()).sum();
		assert!(seen > 0.0 && seen < 1.0);
	}
}
