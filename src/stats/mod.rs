//! Shared numeric utilities for trailing-window statistics
//!
//! Rolling helpers return `Option<f64>` per position: `None` marks a value
//! that is undefined for lack of history (fewer than `min_periods`
//! observations, or the first element of a difference). Callers decide how
//! to fill those gaps, normally with [`back_fill`].
//!
//! Sample statistics use `ddof = 1` so a single observation has an
//! undefined standard deviation.

use statrs::statistics::Statistics;

/// Trailing mean over up to `window` observations.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, min_periods, |w| Some(w.iter().mean()))
}

/// Trailing sample standard deviation over up to `window` observations.
pub fn rolling_std(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, min_periods.max(2), |w| Some(w.iter().std_dev()))
}

/// Trailing OLS slope (per step) over up to `window` observations.
pub fn rolling_slope(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, min_periods, |w| Some(ols_slope(w)))
}

fn rolling_apply<F>(values: &[f64], window: usize, min_periods: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let window = window.max(1);
    (0..values.len())
        .map(|end| {
            let start = (end + 1).saturating_sub(window);
            let slice = &values[start..=end];
            if slice.len() < min_periods {
                None
            } else {
                f(slice)
            }
        })
        .collect()
}

/// Least-squares slope of `values` against their index `0..n`.
///
/// `slope = cov(x, y) / var(x)`. Returns 0 for fewer than two points.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = values.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }

    if var == 0.0 {
        0.0
    } else {
        cov / var
    }
}

/// First difference. Undefined where either neighbour is undefined.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, cur)| match (i.checked_sub(1).and_then(|p| values[p]), cur) {
            (Some(prev), Some(cur)) => Some(cur - prev),
            _ => None,
        })
        .collect()
}

/// Day-over-day change relative to the previous value, times `scale`
/// (1 for a fraction, 100 for percent).
///
/// A zero previous value, or a scaled change that overflows, yields 0
/// rather than an infinite or NaN value.
pub fn pct_change(values: &[f64], scale: f64) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, cur)| {
            let prev = values[i.checked_sub(1)?];
            if prev == 0.0 {
                return Some(0.0);
            }
            let change = (cur - prev) / prev * scale;
            Some(if change.is_finite() { change } else { 0.0 })
        })
        .collect()
}

/// Fill each undefined value from the next defined value after it; any
/// trailing remainder becomes 0.
pub fn back_fill(values: &[Option<f64>]) -> Vec<f64> {
    let mut filled = vec![0.0; values.len()];
    let mut next: Option<f64> = None;
    for (i, value) in values.iter().enumerate().rev() {
        if let Some(v) = (*value).filter(|v| !v.is_nan()) {
            next = Some(v);
        }
        filled[i] = next.unwrap_or(0.0);
    }
    filled
}

/// Whole-series z-scores using the sample standard deviation.
///
/// A zero (or undefined) standard deviation yields all zeros.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let mean = values.iter().mean();
    let std = values.iter().std_dev();
    if std > 0.0 {
        values.iter().map(|v| (v - mean) / std).collect()
    } else {
        vec![0.0; values.len()]
    }
}

/// Min-max scale to 0-1, optionally inverted so the minimum maps to 1.
///
/// Identical inputs scale to all zeros regardless of `invert`.
pub fn min_max_normalize(values: &[f64], invert: bool) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if values.is_empty() || range == 0.0 || !range.is_finite() {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|v| {
            let scaled = (v - min) / range;
            if invert {
                1.0 - scaled
            } else {
                scaled
            }
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks (`q` in 0-100).
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Sample standard deviation, NaN for fewer than two points.
pub fn sample_std(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Round half away from zero to `decimals` places, for presentation only.
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn rolling_mean_uses_available_history() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3, 1);
        let out: Vec<f64> = out.into_iter().map(Option::unwrap).collect();
        assert!((out[0] - 1.0).abs() < EPS);
        assert!((out[1] - 1.5).abs() < EPS);
        assert!((out[2] - 2.0).abs() < EPS);
        assert!((out[3] - 3.0).abs() < EPS);
    }

    #[test]
    fn rolling_std_requires_min_periods() {
        let out = rolling_std(&[2.0, 4.0, 6.0, 8.0], 7, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 2.0).abs() < EPS);
    }

    #[test]
    fn ols_slope_of_a_line() {
        let line: Vec<f64> = (0..7).map(|i| 3.0 - 0.5 * f64::from(i)).collect();
        assert!((ols_slope(&line) + 0.5).abs() < EPS);
        assert_eq!(ols_slope(&[5.0]), 0.0);
        assert_eq!(ols_slope(&[]), 0.0);
    }

    #[test]
    fn rolling_slope_window_is_trailing() {
        // Flat then rising: the last window only sees the rise.
        let values = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0];
        let out = rolling_slope(&values, 3, 3);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap()).abs() < EPS);
        assert!((out[6].unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn diff_propagates_gaps() {
        let out = diff(&[None, Some(1.0), Some(4.0)]);
        assert_eq!(out, vec![None, None, Some(3.0)]);
    }

    #[test]
    fn pct_change_from_zero_is_zero() {
        let out = pct_change(&[0.0, 50.0, 100.0, 0.0, 0.0], 1.0);
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(0.0));
        assert_eq!(out[2], Some(1.0));
        assert_eq!(out[3], Some(-1.0));
        assert_eq!(out[4], Some(0.0));
    }

    #[test]
    fn scaled_change_overflow_is_zero() {
        // ratio 1e307 is finite, 1e309 is not
        let out = pct_change(&[1e-300, 1e7, 2e7], 100.0);
        assert_eq!(out[1], Some(0.0));
        assert_eq!(out[2], Some(100.0));
    }

    #[test]
    fn back_fill_then_zero() {
        assert_eq!(
            back_fill(&[None, None, Some(2.0), None, Some(5.0), None]),
            vec![2.0, 2.0, 2.0, 5.0, 5.0, 0.0]
        );
        assert_eq!(back_fill(&[None]), vec![0.0]);
    }

    #[test]
    fn z_scores_of_constant_series_are_zero() {
        assert_eq!(z_scores(&[3.0, 3.0, 3.0]), vec![0.0; 3]);
        assert_eq!(z_scores(&[3.0]), vec![0.0]);
        let z = z_scores(&[1.0, 2.0, 3.0]);
        assert!((z[0] + 1.0).abs() < EPS);
        assert!(z[1].abs() < EPS);
    }

    #[test]
    fn min_max_normalize_handles_flat_input() {
        assert_eq!(min_max_normalize(&[0.2, 0.2], true), vec![0.0, 0.0]);
        assert_eq!(min_max_normalize(&[0.0, 0.5, 1.0], true), vec![1.0, 0.5, 0.0]);
        assert!(min_max_normalize(&[], false).is_empty());
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert!((percentile(&v, 10.0) - 1.4).abs() < EPS);
        assert!((percentile(&v, 50.0) - 3.0).abs() < EPS);
        assert!((percentile(&v, 100.0) - 5.0).abs() < EPS);
    }
}
