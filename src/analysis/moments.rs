//! Small descriptive-statistics helpers shared by the time-domain extractors.

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (`ddof = 0`).
pub(crate) fn variance(values: &[f64]) -> f64 {
    central_moment(values, 2)
}

/// `k`-th central moment, NaN for an empty slice.
pub(crate) fn central_moment(values: &[f64], k: i32) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// `max - min`, NaN for an empty slice.
pub(crate) fn peak_to_peak(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let (lo, hi) = min_max(values);
    hi - lo
}

/// First difference `x[t] - x[t-1]`.
pub(crate) fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// `numerator / denominator`, NaN when the denominator is zero or not finite.
pub(crate) fn ratio_or_nan(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Shannon entropy (natural log) of non-negative weights after normalizing them to sum 1.
pub(crate) fn shannon_entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return f64::NAN;
    }
    weights
        .iter()
        .map(|w| w / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_is_population_variance() {
        assert!((variance(&[1.0, 2.0, 3.0, 4.0]) - 1.25).abs() < 1e-12);
        assert_eq!(variance(&[5.0; 4]), 0.0);
        assert!(variance(&[]).is_nan());
    }

    #[test]
    fn entropy_of_uniform_weights_is_log_n() {
        let h = shannon_entropy(&[2.0, 2.0, 2.0, 2.0]);
        assert!((h - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(shannon_entropy(&[0.0, 3.0]), 0.0);
        assert!(shannon_entropy(&[0.0, 0.0]).is_nan());
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert!(ratio_or_nan(1.0, 0.0).is_nan());
        assert_eq!(ratio_or_nan(1.0, 4.0), 0.25);
    }
}
