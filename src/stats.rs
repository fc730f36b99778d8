//! Statistical helpers shared by the trackers and the world graph.

// ---------------------------------------------------------------------------
// RunningStats -- Welford online statistics
// ---------------------------------------------------------------------------

/// Welford online algorithm for running mean and variance.
///
/// Used where lifetime statistics are needed without retaining the full
/// sample history (world-graph nodes track these alongside their bounded
/// ring buffers).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new sample.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Number of samples observed.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean, 0.0 before any sample.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, 0.0 below 2 samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Reset to empty.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Window helpers
// ---------------------------------------------------------------------------

/// Arithmetic mean of a slice, 0.0 when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population variance of a slice, 0.0 below 2 samples.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// max - min of a slice, 0.0 when empty.
pub fn range(values: &[f64]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

/// Least-squares slope of values against their indices, 0.0 below 2 samples.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Absolute step deltas between consecutive samples.
pub fn abs_deltas(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welford_matches_batch() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stats = RunningStats::new();
        for v in &values {
            stats.push(*v);
        }
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-9);
        assert!((stats.variance() - 4.0).abs() < 1e-9);
        assert!((stats.variance() - variance(&values)).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_are_neutral() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(std_dev(&[1.0]), 0.0);
        assert_eq!(range(&[]), 0.0);
        assert_eq!(slope(&[]), 0.0);
        assert_eq!(slope(&[3.0]), 0.0);
    }

    #[test]
    fn slope_of_linear_sequence() {
        let values = [1.0, 3.0, 5.0, 7.0, 9.0];
        assert!((slope(&values) - 2.0).abs() < 1e-9);
        let flat = [4.0, 4.0, 4.0];
        assert!(slope(&flat).abs() < 1e-9);
    }

    #[test]
    fn range_and_deltas() {
        let values = [-60.0, -55.0, -70.0];
        assert!((range(&values) - 15.0).abs() < 1e-9);
        let d = abs_deltas(&values);
        assert_eq!(d, vec![5.0, 15.0]);
    }
}
