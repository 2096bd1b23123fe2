use serde::Serialize;

/// Summary statistics of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator); `None` below two observations.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl Describe {
    /// Describe `values`. Returns `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted_copy(values);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });
        Some(Self {
            count,
            mean,
            median: quantile_sorted(&sorted, 0.5)?,
            std,
            min: sorted[0],
            max: sorted[count - 1],
        })
    }

    /// Coefficient of variation (std / mean).
    pub fn cv(&self) -> Option<f64> {
        match self.std {
            Some(std) if self.mean != 0.0 => Some(std / self.mean),
            _ => None,
        }
    }
}

/// The percentiles shown next to the efficiency box plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        Some(Self {
            p25: quantile_sorted(&sorted, 0.25)?,
            p50: quantile_sorted(&sorted, 0.50)?,
            p75: quantile_sorted(&sorted, 0.75)?,
            p95: quantile_sorted(&sorted, 0.95)?,
            p99: quantile_sorted(&sorted, 0.99)?,
        })
    }
}

/// Quantile of an ascending sample with linear interpolation between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}
