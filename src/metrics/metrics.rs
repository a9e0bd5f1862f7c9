//! IQR-trimmed descriptive statistics.

use std::fmt;

use serde::Serialize;

/// Summary of one finalized sample set.
///
/// `mean` is computed over the IQR-trimmed samples while `min` and `max`
/// cover every raw sample, so the reported spread still shows outliers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    values: Vec<f64>,
    trimmed: Vec<f64>,
    min: f64,
    max: f64,
    mean: f64,
    unit: String,
}

impl Metrics {
    /// Compute statistics for a sample set. NaN samples are discarded.
    pub fn record(mut values: Vec<f64>) -> Self {
        values.retain(|v| !v.is_nan());
        if values.is_empty() {
            return Self {
                values,
                trimmed: Vec::new(),
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                unit: String::new(),
            };
        }

        let sorted = sorted(&values);
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo, hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let mut trimmed: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| lo <= *v && *v <= hi)
            .collect();
        if trimmed.is_empty() {
            trimmed = values.clone();
        }

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let mean = (trimmed.iter().sum::<f64>() / trimmed.len() as f64).clamp(min, max);

        Self {
            values,
            trimmed,
            min,
            max,
            mean,
            unit: String::new(),
        }
    }

    /// Set the display unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Raw samples in recording order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Samples inside the IQR acceptance band.
    pub fn trimmed(&self) -> &[f64] {
        &self.trimmed
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Trimmed mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Linear-interpolation quantile over the untrimmed samples.
    ///
    /// Returns NaN for an empty sample set.
    pub fn quantile(&self, q: f64) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        quantile_sorted(&sorted(&self.values), q)
    }

    /// Relative spread between min and max, in percent.
    pub fn spread(&self) -> f64 {
        if self.mean == 0.0 || self.max == 0.0 || self.is_empty() {
            return 0.0;
        }
        let diff = (1.0 - self.min / self.max).max(self.max / self.min - 1.0);
        diff * 100.0
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{} ±{:.0}%", self.mean, self.unit, self.spread())
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// R-7 quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    sorted[lower] + (h - lower as f64) * (sorted[upper] - sorted[lower])
}
