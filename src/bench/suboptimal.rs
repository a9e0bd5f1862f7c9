//! Deciding whether the optimizer missed a faster plan.

use tracing::debug;

use super::plan::PlanCandidate;
use crate::metrics::welch_t_test;

/// A candidate must be at least this much faster before testing.
pub const SPEEDUP_THRESHOLD: f64 = 0.9;

/// Significance level of the equal-means test.
pub const ALPHA: f64 = 0.05;

/// Whether `candidate` is significantly faster than `default`.
///
/// Requires the candidate's trimmed mean to be below 90% of the default's,
/// then a Welch t-test over the trimmed samples. A test that cannot be
/// computed counts as significant, so possible regressions surface.
pub fn is_sub_optimal(default: &PlanCandidate, candidate: &PlanCandidate) -> bool {
    let (Some(base), Some(cand)) = (&default.timing, &candidate.timing) else {
        return false;
    };
    if !(cand.mean() < SPEEDUP_THRESHOLD * base.mean()) {
        return false;
    }
    match welch_t_test(base.trimmed(), cand.trimmed()) {
        Ok(test) => test.rejects(ALPHA),
        Err(e) => {
            debug!(plan = candidate.plan_index, error = %e, "t-test inconclusive, flagging plan");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::plan::PlanFingerprint;
    use crate::executor::Hints;
    use crate::metrics::Metrics;

    fn timed(index: usize, samples: Vec<f64>) -> PlanCandidate {
        let mut plan = PlanCandidate::new(index, "SELECT 1", Hints::default(), PlanFingerprint::default());
        plan.timing = Some(Metrics::record(samples).with_unit("ms"));
        plan
    }

    #[test]
    fn test_ninety_five_percent_never_flagged() {
        let default = timed(0, vec![100.0, 100.0, 100.0, 100.0, 100.0]);
        let candidate = timed(1, vec![95.0, 95.0, 95.0, 95.0, 95.0]);
        assert!(!is_sub_optimal(&default, &candidate));

        let noisy = timed(2, vec![94.0, 95.0, 96.0, 95.0, 95.0]);
        let default = timed(0, vec![99.0, 100.0, 101.0, 100.0, 100.0]);
        assert!(!is_sub_optimal(&default, &noisy));
    }

    #[test]
    fn test_half_time_with_disjoint_samples_flagged() {
        let default = timed(0, vec![98.0, 100.0, 102.0, 99.0, 101.0]);
        let candidate = timed(1, vec![49.0, 50.0, 51.0, 50.5, 49.5]);
        assert!(is_sub_optimal(&default, &candidate));
    }

    #[test]
    fn test_untestable_samples_are_flagged() {
        let default = timed(0, vec![100.0]);
        let candidate = timed(1, vec![40.0]);
        assert!(is_sub_optimal(&default, &candidate));
    }

    #[test]
    fn test_missing_timing_never_flagged() {
        let default = timed(0, vec![100.0, 101.0]);
        let skipped = PlanCandidate::new(1, "SELECT 1", Hints::default(), PlanFingerprint::default());
        assert!(!is_sub_optimal(&default, &skipped));
        assert!(!is_sub_optimal(&skipped, &default));
    }

    #[test]
    fn test_overlapping_samples_not_flagged() {
        let default = timed(0, vec![10.0, 200.0, 15.0, 180.0, 30.0, 150.0]);
        let candidate = timed(1, vec![12.0, 160.0, 20.0, 140.0, 25.0, 90.0]);
        assert!(!is_sub_optimal(&default, &candidate));
    }
}
