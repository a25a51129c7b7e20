//! Scalar reducers over numeric samples.
//!
//! Every reducer returns `f64::NAN` when the statistic is undefined for the
//! input (an empty slice, or fewer than two values for the sample standard
//! deviation).

use std::cmp::Ordering;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Sorted copy of a sample.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Quantile `q` in `[0, 1]` of an already sorted sample.
///
/// Linear interpolation between the two closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted(values), q)
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Pearson correlation coefficient of two equally long samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(xs);
    let my = mean(ys);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

/// Gaussian kernel density estimate with Scott's bandwidth rule.
#[derive(Debug, Clone)]
pub struct Kde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl Kde {
    /// Build an estimator over `samples`.
    ///
    /// Returns `None` when the sample is too small or has no spread.
    pub fn new(samples: &[f64]) -> Option<Self> {
        let sd = std_dev(samples);
        if !sd.is_finite() || sd == 0.0 {
            return None;
        }
        let bandwidth = sd * (samples.len() as f64).powf(-0.2);
        Some(Self {
            samples: samples.to_vec(),
            bandwidth,
        })
    }

    /// Density at `x`; integrates to 1 over the real line.
    pub fn density(&self, x: f64) -> f64 {
        let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * self.bandwidth);
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| {
                let u = (x - s) / self.bandwidth;
                (-0.5 * u * u).exp()
            })
            .sum();
        norm * sum / self.samples.len() as f64
    }

    /// Evaluate the density at `points` evenly spaced positions over `[lo, hi]`.
    pub fn curve(&self, lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
        if points < 2 {
            return vec![(lo, self.density(lo))];
        }
        let step = (hi - lo) / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let x = lo + step * i as f64;
                (x, self.density(x))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(mean(&v), 5.0));
        // sample std of this classic series is sqrt(32/7)
        assert!(approx(std_dev(&v), (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_undefined_statistics_are_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[1.0]).is_nan());
        assert!(median(&[]).is_nan());
        assert!(min(&[]).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&v, 0.25), 1.75));
        assert!(approx(median(&v), 2.5));
        assert!(approx(quantile(&v, 0.0), 1.0));
        assert!(approx(quantile(&v, 1.0), 4.0));
    }

    #[test]
    fn test_median_ignores_input_order() {
        assert!(approx(median(&[9.0, 1.0, 5.0]), 5.0));
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        let neg = [8.0, 6.0, 4.0, 2.0];
        assert!(approx(pearson(&xs, &ys), 1.0));
        assert!(approx(pearson(&xs, &neg), -1.0));
        assert!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let samples = [1.0, 2.0, 2.5, 3.0, 7.0];
        let kde = Kde::new(&samples).unwrap();
        let curve = kde.curve(-20.0, 30.0, 5001);
        let step = 50.0 / 5000.0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 1e-3, "area was {}", area);
    }

    #[test]
    fn test_kde_rejects_constant_sample() {
        assert!(Kde::new(&[3.0, 3.0, 3.0]).is_none());
        assert!(Kde::new(&[3.0]).is_none());
    }
}
