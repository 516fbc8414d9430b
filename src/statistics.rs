use average::{Estimate, Variance};

/// Running summary of the final state-of-charge estimate over repeated
/// executions.
#[must_use]
#[derive(Default)]
pub struct RunStatistics {
    final_soc_percent: Variance,
}

impl RunStatistics {
    pub fn record(&mut self, final_soc_percent: f64) {
        self.final_soc_percent.add(final_soc_percent);
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.final_soc_percent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.final_soc_percent.mean()
    }

    #[must_use]
    pub fn population_variance(&self) -> f64 {
        self.final_soc_percent.population_variance()
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.population_variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn moments_over_recorded_runs() {
        let mut statistics = RunStatistics::default();
        for final_soc in [1.0, 2.0, 3.0, 4.0] {
            statistics.record(final_soc);
        }
        assert_eq!(statistics.len(), 4);
        assert!(!statistics.is_empty());
        assert_abs_diff_eq!(statistics.mean(), 2.5);
        assert_abs_diff_eq!(statistics.population_variance(), 1.25);
        assert_abs_diff_eq!(statistics.std_dev(), 1.25_f64.sqrt());
    }

    #[test]
    fn empty_statistics() {
        let statistics = RunStatistics::default();
        assert!(statistics.is_empty());
        assert_eq!(statistics.len(), 0);
    }
}
