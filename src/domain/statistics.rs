// Window statistics over ordered numeric samples
//
// Callers guarantee non-empty input (the engine's minimum window guard);
// an empty slice yields NaN.

/// Shifted by the first element so a constant window averages to exactly
/// that constant.
pub fn mean(xs: &[f64]) -> f64 {
    let Some(&pivot) = xs.first() else {
        return f64::NAN;
    };
    pivot + xs.iter().map(|x| x - pivot).sum::<f64>() / xs.len() as f64
}

/// Population standard deviation (divides by N).
pub fn std_dev(xs: &[f64]) -> f64 {
    let m = mean(xs);
    let sum_sq: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / xs.len() as f64).sqrt()
}

/// A zero standard deviation is treated as 1, so a flat window gives
/// `value - mean` instead of NaN or infinity.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    let divisor = if std_dev == 0.0 { 1.0 } else { std_dev };
    (value - mean) / divisor
}

pub fn max(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Net change from the first to the last element.
pub fn drift(xs: &[f64]) -> f64 {
    match (xs.first(), xs.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    }
}
