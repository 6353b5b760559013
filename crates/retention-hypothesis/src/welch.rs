//! Welch's unequal-variance two-sample t-test
//!
//! The difference `mean1 - mean2` is standardized by the unpooled standard
//! error `sqrt(v1/n1 + v2/n2)` and referred to a Student-t distribution with
//! Welch-Satterthwaite degrees of freedom:
//!
//! ```text
//! df = (v1/n1 + v2/n2)^2 / ((v1/n1)^2/(n1-1) + (v2/n2)^2/(n2-1))
//! ```

use crate::outcome::{interval_from_margin, Reference};
use crate::{SampleSummary, TestConfig, TestKind, TestOutcome};
use retention_core::{Error, Result};

/// Welch two-sample t-test
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchTTest {
    config: TestConfig,
}

impl WelchTTest {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Run the test on two raw numeric samples
    pub fn test_values(&self, group1: &[f64], group2: &[f64]) -> Result<TestOutcome> {
        self.test(
            &SampleSummary::from_values(group1),
            &SampleSummary::from_values(group2),
        )
    }

    /// Run the test on two samples of 0/1 outcomes
    pub fn test_binary(&self, group1: &[u8], group2: &[u8]) -> Result<TestOutcome> {
        self.test(
            &SampleSummary::from_binary(group1),
            &SampleSummary::from_binary(group2),
        )
    }

    /// Run the test on precomputed summaries
    ///
    /// # Errors
    /// Returns [`Error::DegenerateInput`] if either group has fewer than two
    /// observations or zero variance.
    pub fn test(&self, group1: &SampleSummary, group2: &SampleSummary) -> Result<TestOutcome> {
        check_group("group1", group1)?;
        check_group("group2", group2)?;

        let se1 = group1.mean_variance();
        let se2 = group2.mean_variance();
        let std_error = (se1 + se2).sqrt();
        if !(std_error.is_finite() && std_error > 0.0) {
            return Err(Error::non_finite("Welch standard error"));
        }

        let df = (se1 + se2).powi(2)
            / (se1.powi(2) / (group1.n - 1) as f64 + se2.powi(2) / (group2.n - 1) as f64);

        let diff = group1.mean - group2.mean;
        let statistic = diff / std_error;
        if !statistic.is_finite() {
            return Err(Error::non_finite("t statistic"));
        }

        let reference = Reference::students_t(df)?;
        let pvalue = reference.pvalue(statistic, self.config.alternative());

        let critical = reference.inverse_cdf(self.config.critical_probability());
        if !critical.is_finite() {
            return Err(Error::non_finite("t critical value"));
        }
        let interval = interval_from_margin(
            diff,
            critical * std_error,
            self.config.alternative(),
            self.config.confidence_level(),
        );

        Ok(TestOutcome {
            kind: TestKind::TTest,
            statistic,
            pvalue,
            interval,
            degrees_of_freedom: Some(df),
        })
    }
}

fn check_group(name: &str, group: &SampleSummary) -> Result<()> {
    if group.n < 2 {
        return Err(Error::too_few_observations(name, 2, group.n));
    }
    if !group.variance.is_finite() {
        return Err(Error::non_finite(&format!("{name} variance")));
    }
    if group.variance <= 0.0 {
        return Err(Error::zero_variance(name));
    }
    Ok(())
}
