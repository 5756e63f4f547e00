//! Descriptive statistics over scraped prices.
//!
//! Quartiles use the median-of-halves method: q1 is the median of the sorted
//! elements before the overall median index, q3 the median of those after it.
//! This is fixed for reproducibility; nearest-rank or linear interpolation
//! would give different values for the same sample.

use crate::error::{AppError, Result};
use crate::types::PriceStatistics;

/// Compute min/max/mean/median/quartiles over a set of valid prices.
/// Pure function of the input multiset: the slice is sorted internally, so
/// any permutation of the same prices yields bit-identical output.
pub fn compute_statistics(prices: &[f64]) -> Result<PriceStatistics> {
    if prices.is_empty() {
        return Err(AppError::EmptyInput);
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    // Summing in sorted order keeps the mean order-independent.
    let average = sorted.iter().sum::<f64>() / n as f64;
    let median = median_of(&sorted);

    let mid = n / 2;
    let (lower, upper) = if n % 2 == 0 {
        (&sorted[..mid], &sorted[mid..])
    } else {
        (&sorted[..mid], &sorted[mid + 1..])
    };
    let q1 = (!lower.is_empty()).then(|| median_of(lower));
    let q3 = (!upper.is_empty()).then(|| median_of(upper));

    Ok(PriceStatistics {
        min,
        max,
        average,
        median,
        q1,
        q3,
        total_products: n,
    })
}

/// Median of an ascending-sorted non-empty slice.
fn median_of(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(compute_statistics(&[]), Err(AppError::EmptyInput)));
    }

    #[test]
    fn single_price_has_no_quartiles() {
        let s = compute_statistics(&[5.0]).unwrap();
        assert_eq!(s.min, 5.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.median, 5.0);
        assert_eq!(s.average, 5.0);
        assert_eq!(s.q1, None);
        assert_eq!(s.q3, None);
        assert_eq!(s.total_products, 1);
    }

    #[test]
    fn even_count_quartiles_by_median_of_halves() {
        let s = compute_statistics(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_eq!(s.min, 10.0);
        assert_eq!(s.max, 40.0);
        assert_eq!(s.average, 25.0);
        assert_eq!(s.median, 25.0);
        assert_eq!(s.q1, Some(15.0));
        assert_eq!(s.q3, Some(35.0));
        assert_eq!(s.total_products, 4);
    }

    #[test]
    fn odd_count_excludes_median_from_halves() {
        // [1,2,3,4,5] → median 3, lower [1,2], upper [4,5]
        let s = compute_statistics(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q1, Some(1.5));
        assert_eq!(s.q3, Some(4.5));
    }

    #[test]
    fn two_prices_split_into_singleton_halves() {
        let s = compute_statistics(&[100.0, 200.0]).unwrap();
        assert_eq!(s.median, 150.0);
        assert_eq!(s.q1, Some(100.0));
        assert_eq!(s.q3, Some(200.0));
    }

    #[test]
    fn permutations_yield_identical_output() {
        let base = [35.0, 12.5, 99.0, 7.25, 12.5, 60.0];
        let reference = compute_statistics(&base).unwrap();
        let permutations: [[f64; 6]; 3] = [
            [12.5, 35.0, 7.25, 99.0, 60.0, 12.5],
            [99.0, 60.0, 35.0, 12.5, 12.5, 7.25],
            [7.25, 12.5, 12.5, 35.0, 60.0, 99.0],
        ];
        for p in &permutations {
            let s = compute_statistics(p).unwrap();
            assert_eq!(s, reference);
        }
    }

    #[test]
    fn quartile_ordering_invariant() {
        let samples: [&[f64]; 4] = [
            &[3.0, 1.0, 2.0],
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            &[5.5, 5.5, 5.5, 5.5],
            &[1_000_000.0, 250_000.0, 745_000.0, 2_100_000.0, 89_000.0],
        ];
        for prices in &samples {
            let s = compute_statistics(prices).unwrap();
            assert!(s.min <= s.median && s.median <= s.max);
            if let (Some(q1), Some(q3)) = (s.q1, s.q3) {
                assert!(s.min <= q1, "min <= q1 for {prices:?}");
                assert!(q1 <= s.median, "q1 <= median for {prices:?}");
                assert!(s.median <= q3, "median <= q3 for {prices:?}");
                assert!(q3 <= s.max, "q3 <= max for {prices:?}");
            }
        }
    }
}
