//! Proportion tests over real cohort retention data
//!
//! Cohort rows arrive pre-aggregated from the warehouse as
//! `(period, group, cohort_count, retained_count)`. Rows are summed per
//! period and group, then each period's control group is compared with the
//! treated group.

use crate::{Proportion, ProportionsZTest, TestOutcome};
use retention_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// One aggregated cohort row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortRow {
    /// Lifetime period (e.g. month since subscription)
    pub period: u32,
    /// Group label, compared against the configured control/treated labels
    pub group: String,
    pub cohort_count: u64,
    pub retained_count: u64,
}

impl CohortRow {
    pub fn new(period: u32, group: impl Into<String>, cohort_count: u64, retained_count: u64) -> Self {
        Self {
            period,
            group: group.into(),
            cohort_count,
            retained_count,
        }
    }
}

/// Summed counts of one group within a period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTotals {
    pub cohort_count: u64,
    pub retained_count: u64,
    /// Retained share in percent, rounded to two decimals
    pub retained_percent: f64,
}

impl GroupTotals {
    fn new(cohort_count: u64, retained_count: u64) -> Self {
        let percent = retained_count as f64 / cohort_count as f64 * 100.0;
        Self {
            cohort_count,
            retained_count,
            retained_percent: (percent * 100.0).round() / 100.0,
        }
    }
}

/// Proportion test result for one period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodTest {
    pub period: u32,
    pub outcome: TestOutcome,
    pub stat_sig: bool,
    pub control: GroupTotals,
    pub treated: GroupTotals,
}

/// Runs a proportions z-test per period on cohort rows
#[derive(Debug, Clone)]
pub struct CohortTestRunner {
    test: ProportionsZTest,
    control_label: String,
    treated_label: String,
    significance_level: f64,
}

impl CohortTestRunner {
    pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

    /// Compare `control_label` (first group) against `treated_label`
    pub fn new(control_label: impl Into<String>, treated_label: impl Into<String>) -> Self {
        Self {
            test: ProportionsZTest::default(),
            control_label: control_label.into(),
            treated_label: treated_label.into(),
            significance_level: Self::DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }

    /// Use a custom proportions test
    pub fn with_test(mut self, test: ProportionsZTest) -> Self {
        self.test = test;
        self
    }

    /// Threshold at or below which a p-value counts as significant
    pub fn with_significance_level(mut self, significance_level: f64) -> Result<Self> {
        if !(significance_level > 0.0 && significance_level < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "significance level {significance_level} must be in (0, 1)"
            )));
        }
        self.significance_level = significance_level;
        Ok(self)
    }

    /// Test every period present in `rows`, in ascending period order
    ///
    /// Rows whose group matches neither label are ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if a period lacks one of the two
    /// groups or retained counts exceed cohort counts. Every error names the
    /// offending period.
    pub fn run(&self, rows: &[CohortRow]) -> Result<Vec<PeriodTest>> {
        let mut totals: BTreeMap<u32, [(u64, u64); 2]> = BTreeMap::new();
        for row in rows {
            let slot = if row.group == self.control_label {
                0
            } else if row.group == self.treated_label {
                1
            } else {
                continue;
            };
            let entry = totals.entry(row.period).or_insert([(0, 0); 2]);
            entry[slot].0 += row.cohort_count;
            entry[slot].1 += row.retained_count;
        }

        let mut results = Vec::with_capacity(totals.len());
        for (period, [control, treated]) in totals {
            if control.0 == 0 || treated.0 == 0 {
                return Err(Error::InvalidParameter(format!(
                    "period {period} needs both '{}' and '{}' cohorts",
                    self.control_label, self.treated_label
                )));
            }

            let test_period = || -> Result<TestOutcome> {
                let control = Proportion::new(control.1, control.0)?;
                let treated = Proportion::new(treated.1, treated.0)?;
                self.test.test(&control, &treated)
            };
            let outcome = test_period().map_err(|e| match e {
                Error::DegenerateInput(msg) => {
                    Error::DegenerateInput(format!("period {period}: {msg}"))
                }
                Error::InvalidParameter(msg) => {
                    Error::InvalidParameter(format!("period {period}: {msg}"))
                }
                other => other,
            })?;
            debug!(period, pvalue = outcome.pvalue, "cohort period tested");

            results.push(PeriodTest {
                period,
                stat_sig: outcome.is_significant(self.significance_level),
                outcome,
                control: GroupTotals::new(control.0, control.1),
                treated: GroupTotals::new(treated.0, treated.1),
            });
        }
        Ok(results)
    }
}
