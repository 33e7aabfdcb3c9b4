#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running min/max/mean/count accumulator for one named series within a generation (population
/// fitness, neuron count, connection count, and so on).
#[derive(Debug, Clone, Copy, Default)]
pub struct Metric {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Metric {
    pub fn new() -> Self {
        Metric {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary {
            count: self.count,
            mean: if self.count == 0 {
                0.0
            } else {
                self.sum / self.count as f64
            },
            min: if self.count == 0 { 0.0 } else { self.min },
            max: if self.count == 0 { 0.0 } else { self.max },
        }
    }
}

impl FromIterator<f64> for Metric {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut metric = Metric::new();
        for value in iter {
            metric.add(value);
        }
        metric
    }
}

/// A frozen snapshot of a [`Metric`], the shape that gets checkpointed and exported.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metric_summarizes_to_zero() {
        let summary = Metric::new().summary();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, 0.0);
    }

    #[test]
    fn tracks_min_max_mean() {
        let metric: Metric = [1.0, 2.0, 3.0].into_iter().collect();
        let summary = metric.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.mean, 2.0);
    }
}
