//! Two-independent-proportions z-test
//!
//! Compares `p1 = count1 / nobs1` with `p2 = count2 / nobs2` through a normal
//! approximation. The interval for `p1 - p2` defaults to Newcombe's hybrid
//! score interval, which combines two Wilson score intervals and stays inside
//! [-1, 1] at extreme proportions where the Wald interval breaks down.

use crate::outcome::{interval_from_margin, Reference};
use crate::{Alternative, ConfidenceInterval, Proportion, TestConfig, TestKind, TestOutcome};
use retention_core::{Error, Result};

/// How the z statistic's standard error is formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZTestMethod {
    /// Add one success and one failure to each group, unpooled variance
    #[default]
    AgrestiCaffo,
    /// Unpooled variance of the observed proportions
    Wald,
    /// Pooled proportion under the null of no difference
    Pooled,
}

/// How the interval for `p1 - p2` is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalMethod {
    /// Newcombe's hybrid score interval from two Wilson intervals
    #[default]
    Newcombe,
    /// `diff ± z * se` with the unpooled standard error
    Wald,
    /// Wald interval on Agresti-Caffo adjusted counts
    AgrestiCaffo,
}

/// Two-independent-proportions z-test
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionsZTest {
    config: TestConfig,
    method: ZTestMethod,
    interval_method: IntervalMethod,
}

impl ProportionsZTest {
    pub fn new(config: TestConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Select the statistic's standard error
    pub fn with_method(mut self, method: ZTestMethod) -> Self {
        self.method = method;
        self
    }

    /// Select the interval construction
    pub fn with_interval_method(mut self, interval_method: IntervalMethod) -> Self {
        self.interval_method = interval_method;
        self
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn method(&self) -> ZTestMethod {
        self.method
    }

    pub fn interval_method(&self) -> IntervalMethod {
        self.interval_method
    }

    /// Run the test on success counts
    ///
    /// # Errors
    /// Returns [`Error::DegenerateInput`] if either group is empty or has
    /// all-identical outcomes.
    pub fn test(&self, group1: &Proportion, group2: &Proportion) -> Result<TestOutcome> {
        check_group("group1", group1)?;
        check_group("group2", group2)?;

        let (diff, variance) = match self.method {
            ZTestMethod::AgrestiCaffo => unpooled(&adjusted(group1), &adjusted(group2)),
            ZTestMethod::Wald => unpooled(
                &(group1.count as f64, group1.nobs as f64),
                &(group2.count as f64, group2.nobs as f64),
            ),
            ZTestMethod::Pooled => {
                let pooled = (group1.count + group2.count) as f64
                    / (group1.nobs + group2.nobs) as f64;
                let variance = pooled
                    * (1.0 - pooled)
                    * (1.0 / group1.nobs as f64 + 1.0 / group2.nobs as f64);
                (group1.rate() - group2.rate(), variance)
            }
        };

        let std_error = variance.sqrt();
        if !(std_error.is_finite() && std_error > 0.0) {
            return Err(Error::non_finite("proportion standard error"));
        }
        let statistic = diff / std_error;
        if !statistic.is_finite() {
            return Err(Error::non_finite("z statistic"));
        }

        let reference = Reference::standard_normal()?;
        let pvalue = reference.pvalue(statistic, self.config.alternative());
        let interval = self.interval(group1, group2, &reference)?;

        Ok(TestOutcome {
            kind: TestKind::ProportionTest,
            statistic,
            pvalue,
            interval,
            degrees_of_freedom: None,
        })
    }

    fn interval(
        &self,
        group1: &Proportion,
        group2: &Proportion,
        reference: &Reference,
    ) -> Result<ConfidenceInterval> {
        let alternative = self.config.alternative();
        let level = self.config.confidence_level();
        let diff = group1.rate() - group2.rate();
        let z = reference.inverse_cdf(self.config.critical_probability());

        let interval = match self.interval_method {
            IntervalMethod::Wald => {
                let (_, variance) = unpooled(
                    &(group1.count as f64, group1.nobs as f64),
                    &(group2.count as f64, group2.nobs as f64),
                );
                interval_from_margin(diff, z * variance.sqrt(), alternative, level)
            }
            IntervalMethod::AgrestiCaffo => {
                let (adjusted_diff, variance) = unpooled(&adjusted(group1), &adjusted(group2));
                let margin = z * variance.sqrt();
                let mut interval = interval_from_margin(adjusted_diff, margin, alternative, level);
                interval.estimate = diff;
                interval
            }
            IntervalMethod::Newcombe => {
                // One-sided bounds at 1 - alpha come from the two-sided Wilson
                // intervals at 1 - 2 * alpha, which share the critical value `z`.
                let (low1, upp1) = wilson_bounds(group1, z);
                let (low2, upp2) = wilson_bounds(group2, z);
                let (p1, p2) = (group1.rate(), group2.rate());

                let lower = diff - ((p1 - low1).powi(2) + (upp2 - p2).powi(2)).sqrt();
                let upper = diff + ((p2 - low2).powi(2) + (upp1 - p1).powi(2)).sqrt();
                let (lower, upper) = match alternative {
                    Alternative::TwoSided => (lower, upper),
                    Alternative::Larger => (lower, f64::INFINITY),
                    Alternative::Smaller => (f64::NEG_INFINITY, upper),
                };
                ConfidenceInterval::new(lower, upper, diff, level)
            }
        };

        if interval.lower.is_nan() || interval.upper.is_nan() {
            return Err(Error::non_finite("proportion confidence interval"));
        }
        Ok(interval)
    }
}

/// Two-sided Wilson score interval for a single proportion
pub fn wilson_score_interval(
    proportion: &Proportion,
    confidence_level: f64,
) -> Result<ConfidenceInterval> {
    if proportion.nobs == 0 {
        return Err(Error::too_few_observations("proportion", 1, 0));
    }
    let config = TestConfig::new(Alternative::TwoSided, confidence_level)?;
    let z = Reference::standard_normal()?.inverse_cdf(config.critical_probability());
    let (lower, upper) = wilson_bounds(proportion, z);
    Ok(ConfidenceInterval::new(
        lower,
        upper,
        proportion.rate(),
        confidence_level,
    ))
}

fn wilson_bounds(proportion: &Proportion, z: f64) -> (f64, f64) {
    let n = proportion.nobs as f64;
    let p = proportion.rate();
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let half_width = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;
    (center - half_width, center + half_width)
}

fn adjusted(group: &Proportion) -> (f64, f64) {
    ((group.count + 1) as f64, (group.nobs + 2) as f64)
}

/// Difference of rates and unpooled variance from `(count, nobs)` pairs
fn unpooled(group1: &(f64, f64), group2: &(f64, f64)) -> (f64, f64) {
    let p1 = group1.0 / group1.1;
    let p2 = group2.0 / group2.1;
    let variance = p1 * (1.0 - p1) / group1.1 + p2 * (1.0 - p2) / group2.1;
    (p1 - p2, variance)
}

fn check_group(name: &str, group: &Proportion) -> Result<()> {
    if group.count > group.nobs {
        return Err(Error::InvalidParameter(format!(
            "{name} success count {} exceeds observations {}",
            group.count, group.nobs
        )));
    }
    if group.nobs < 2 {
        return Err(Error::too_few_observations(name, 2, group.nobs));
    }
    if group.is_constant() {
        return Err(Error::zero_variance(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn prop(count: u64, nobs: u64) -> Proportion {
        Proportion::new(count, nobs).unwrap()
    }

    #[test]
    fn test_pooled_known_values() {
        let test = ProportionsZTest::default().with_method(ZTestMethod::Pooled);
        let outcome = test.test(&prop(45, 100), &prop(30, 100)).unwrap();

        // pooled p = 0.375, se = sqrt(0.375 * 0.625 * 0.02)
        let expected = 0.15 / (0.375f64 * 0.625 * 0.02).sqrt();
        assert_eq!(outcome.kind, TestKind::ProportionTest);
        assert_relative_eq!(outcome.statistic, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(outcome.pvalue, 0.02846, epsilon = 1e-3);
        assert!(outcome.degrees_of_freedom.is_none());
    }

    #[test]
    fn test_wald_statistic() {
        let test = ProportionsZTest::default().with_method(ZTestMethod::Wald);
        let outcome = test.test(&prop(45, 100), &prop(30, 100)).unwrap();

        let se = (0.45f64 * 0.55 / 100.0 + 0.30 * 0.70 / 100.0).sqrt();
        assert_relative_eq!(outcome.statistic, 0.15 / se, epsilon = 1e-12);
    }

    #[test]
    fn test_agresti_caffo_statistic() {
        let outcome = ProportionsZTest::default()
            .test(&prop(45, 100), &prop(30, 100))
            .unwrap();

        let (p1, p2) = (46.0 / 102.0, 31.0 / 102.0);
        let se = (p1 * (1.0 - p1) / 102.0 + p2 * (1.0 - p2) / 102.0f64).sqrt();
        assert_relative_eq!(outcome.statistic, (p1 - p2) / se, epsilon = 1e-12);
    }

    #[test]
    fn test_wilson_known_interval() {
        let ci = wilson_score_interval(&prop(45, 100), 0.95).unwrap();
        assert_abs_diff_eq!(ci.lower, 0.3561, epsilon = 1e-3);
        assert_abs_diff_eq!(ci.upper, 0.5476, epsilon = 1e-3);
        assert_abs_diff_eq!(ci.estimate, 0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_wilson_stays_in_unit_interval() {
        for count in [0, 1, 99, 100] {
            let ci = wilson_score_interval(&prop(count, 100), 0.95).unwrap();
            assert!(ci.lower >= -1e-12 && ci.upper <= 1.0 + 1e-12, "{count}: {ci}");
        }
    }

    #[test]
    fn test_newcombe_brackets_difference() {
        let outcome = ProportionsZTest::default()
            .test(&prop(45, 100), &prop(30, 100))
            .unwrap();

        let ci = outcome.interval;
        assert_abs_diff_eq!(ci.estimate, 0.15, epsilon = 1e-12);
        assert!(ci.lower < 0.15 && ci.upper > 0.15);
        assert!(ci.lower > 0.0, "significant difference should exclude zero: {ci}");
        assert!(ci.lower >= -1.0 && ci.upper <= 1.0);
    }

    #[test]
    fn test_newcombe_one_sided_matches_lower_bound_at_doubled_alpha() {
        let a = prop(620, 1_000);
        let b = prop(580, 1_000);

        let larger = ProportionsZTest::new(
            TestConfig::default().with_alternative(Alternative::Larger),
        )
        .test(&a, &b)
        .unwrap();
        let two_sided_90 =
            ProportionsZTest::new(TestConfig::new(Alternative::TwoSided, 0.90).unwrap())
                .test(&a, &b)
                .unwrap();

        assert_relative_eq!(larger.interval.lower, two_sided_90.interval.lower, epsilon = 1e-12);
        assert_eq!(larger.interval.upper, f64::INFINITY);
        assert!(larger.interval.is_one_sided());

        let smaller = ProportionsZTest::new(
            TestConfig::default().with_alternative(Alternative::Smaller),
        )
        .test(&a, &b)
        .unwrap();
        assert_relative_eq!(smaller.interval.upper, two_sided_90.interval.upper, epsilon = 1e-12);
        assert_eq!(smaller.interval.lower, f64::NEG_INFINITY);
    }

    #[test]
    fn test_interval_methods_agree_for_large_samples() {
        let a = prop(6_350, 10_000);
        let b = prop(6_150, 10_000);

        let intervals: Vec<_> = [
            IntervalMethod::Newcombe,
            IntervalMethod::Wald,
            IntervalMethod::AgrestiCaffo,
        ]
        .into_iter()
        .map(|m| {
            ProportionsZTest::default()
                .with_interval_method(m)
                .test(&a, &b)
                .unwrap()
                .interval
        })
        .collect();

        for ci in &intervals[1..] {
            assert_abs_diff_eq!(ci.lower, intervals[0].lower, epsilon = 5e-4);
            assert_abs_diff_eq!(ci.upper, intervals[0].upper, epsilon = 5e-4);
            assert_abs_diff_eq!(ci.estimate, 0.02, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_groups_are_degenerate() {
        let test = ProportionsZTest::default();
        assert!(test.test(&prop(0, 500), &prop(250, 500)).unwrap_err().is_degenerate());
        assert!(test.test(&prop(250, 500), &prop(500, 500)).unwrap_err().is_degenerate());
        assert!(test.test(&prop(0, 0), &prop(250, 500)).unwrap_err().is_degenerate());
    }

    #[test]
    fn test_count_above_nobs_is_invalid() {
        let bogus = Proportion { count: 11, nobs: 10 };
        let err = ProportionsZTest::default().test(&bogus, &prop(5, 10)).unwrap_err();
        assert!(err.is_invalid_parameter());
    }
}
