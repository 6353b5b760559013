//! Both tests run side by side on the same binary data

use crate::{
    IntervalMethod, Proportion, ProportionsZTest, SampleSummary, TestConfig, TestOutcome,
    WelchTTest, ZTestMethod,
};
use retention_core::Result;

/// Outcomes of the two tests computed on identical data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedOutcome {
    pub t_test: TestOutcome,
    pub proportion_test: TestOutcome,
}

/// Runs a Welch t-test and a proportions z-test on the same pair of samples
#[derive(Debug, Clone, Copy, Default)]
pub struct TestStatisticEngine {
    welch: WelchTTest,
    proportions: ProportionsZTest,
}

impl TestStatisticEngine {
    /// Create an engine where both tests share one configuration
    pub fn new(config: TestConfig) -> Self {
        Self {
            welch: WelchTTest::new(config),
            proportions: ProportionsZTest::new(config),
        }
    }

    /// Select the z-test's standard error
    pub fn with_z_method(mut self, method: ZTestMethod) -> Self {
        self.proportions = self.proportions.with_method(method);
        self
    }

    /// Select the z-test's interval construction
    pub fn with_interval_method(mut self, method: IntervalMethod) -> Self {
        self.proportions = self.proportions.with_interval_method(method);
        self
    }

    pub fn config(&self) -> &TestConfig {
        self.welch.config()
    }

    pub fn welch(&self) -> &WelchTTest {
        &self.welch
    }

    pub fn proportions(&self) -> &ProportionsZTest {
        &self.proportions
    }

    /// Run both tests on two samples of 0/1 outcomes
    ///
    /// `successes1` / `successes2` must be the number of ones in each sample;
    /// callers that already tracked them while sampling avoid a recount.
    pub fn compare_binary_counted(
        &self,
        group1: &[u8],
        successes1: u64,
        group2: &[u8],
        successes2: u64,
    ) -> Result<PairedOutcome> {
        let t_test = self.welch.test(
            &SampleSummary::from_binary(group1),
            &SampleSummary::from_binary(group2),
        )?;
        let proportion_test = self.proportions.test(
            &Proportion::new(successes1, group1.len() as u64)?,
            &Proportion::new(successes2, group2.len() as u64)?,
        )?;

        Ok(PairedOutcome {
            t_test,
            proportion_test,
        })
    }

    /// Run both tests on two samples of 0/1 outcomes
    pub fn compare_binary(&self, group1: &[u8], group2: &[u8]) -> Result<PairedOutcome> {
        self.compare_binary_counted(group1, count_ones(group1), group2, count_ones(group2))
    }
}

fn count_ones(outcomes: &[u8]) -> u64 {
    outcomes.iter().filter(|&&x| x != 0).count() as u64
}
