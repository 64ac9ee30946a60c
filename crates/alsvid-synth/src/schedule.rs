//! Cooling law for the annealer.

/// Exponentially decaying temperature driven by accepted moves.
///
/// `T = t0 * exp(-accepted / (len * normalizer))`, so the schedule cools as
/// the chain makes progress rather than on wall-clock steps, and longer
/// circuits cool proportionally slower.
#[derive(Debug, Clone)]
pub struct ExponentialSchedule {
    start_temp: f64,
    normalizer: f64,
    accepted: u64,
}

impl ExponentialSchedule {
    pub fn new(start_temp: f64, normalizer: f64) -> Self {
        Self {
            start_temp,
            normalizer,
            accepted: 0,
        }
    }

    /// Current temperature for a circuit of `len` positions.
    pub fn temperature(&self, len: usize) -> f64 {
        let scale = (len.max(1) as f64) * self.normalizer;
        self.start_temp * (-(self.accepted as f64) / scale).exp()
    }

    /// Records an accepted move, cooling the schedule.
    pub fn record_acceptance(&mut self) {
        self.accepted += 1;
    }

    /// Number of accepted moves so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_initial_temperature() {
        let schedule = ExponentialSchedule::new(0.25, 80.0);
        assert_eq!(schedule.temperature(10), 0.25);
    }

    #[test]
    fn cools_monotonically_with_acceptances() {
        let mut schedule = ExponentialSchedule::new(0.25, 80.0);
        let mut last = schedule.temperature(10);
        for _ in 0..100 {
            schedule.record_acceptance();
            let t = schedule.temperature(10);
            assert!(t < last);
            last = t;
        }
    }

    #[test]
    fn longer_circuits_cool_slower() {
        let mut schedule = ExponentialSchedule::new(0.25, 80.0);
        for _ in 0..500 {
            schedule.record_acceptance();
        }
        assert!(schedule.temperature(40) > schedule.temperature(10));
    }
}
