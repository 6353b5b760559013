//! Tabular output and summaries of sweep results

use crate::sweep::SweepResult;
use crate::trial::TestResult;
use ordered_float::OrderedFloat;
use retention_core::{Error, Result};
use retention_hypothesis::TestKind;
use serde::Serialize;
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::BTreeMap;
use std::io;

/// Flat CSV row; column order is part of the output contract
#[derive(Serialize)]
struct CsvRecord {
    test: &'static str,
    trial: usize,
    statistic: f64,
    pvalue: f64,
    ci_low: f64,
    ci_high: f64,
    stat_sig: bool,
    baseline_rate: f64,
    mde: f64,
    population: u64,
    control_ratio: f64,
}

impl From<&TestResult> for CsvRecord {
    fn from(row: &TestResult) -> Self {
        Self {
            test: row.kind.name(),
            trial: row.trial,
            statistic: row.statistic,
            pvalue: row.pvalue,
            ci_low: row.ci_low,
            ci_high: row.ci_high,
            stat_sig: row.stat_sig,
            baseline_rate: row.design.baseline_rate(),
            mde: row.design.minimum_detectable_effect(),
            population: row.design.population(),
            control_ratio: row.design.control_ratio(),
        }
    }
}

/// Numeric column of a result row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Statistic,
    Pvalue,
    CiLow,
    CiHigh,
}

impl Metric {
    fn value(&self, row: &TestResult) -> f64 {
        match self {
            Self::Statistic => row.statistic,
            Self::Pvalue => row.pvalue,
            Self::CiLow => row.ci_low,
            Self::CiHigh => row.ci_high,
        }
    }
}

/// Design parameter to group summaries by, on top of the test kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    BaselineRate,
    Mde,
    Population,
    ControlRatio,
}

/// Grouping key of a [`Summary`]; parameters not grouped on are `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub kind: TestKind,
    pub baseline_rate: Option<OrderedFloat<f64>>,
    pub mde: Option<OrderedFloat<f64>>,
    pub population: Option<u64>,
    pub control_ratio: Option<OrderedFloat<f64>>,
}

impl GroupKey {
    fn of(row: &TestResult, grouping: &[GroupBy]) -> Self {
        let has = |g| grouping.contains(&g);
        let design = &row.design;
        Self {
            kind: row.kind,
            baseline_rate: has(GroupBy::BaselineRate)
                .then(|| OrderedFloat(design.baseline_rate())),
            mde: has(GroupBy::Mde).then(|| OrderedFloat(design.minimum_detectable_effect())),
            population: has(GroupBy::Population).then(|| design.population()),
            control_ratio: has(GroupBy::ControlRatio)
                .then(|| OrderedFloat(design.control_ratio())),
        }
    }
}

/// Descriptive statistics of one metric within one group
///
/// Only finite values are summarized. Infinite one-sided interval bounds are
/// counted in `excluded`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub key: GroupKey,
    /// Number of finite values summarized
    pub count: usize,
    /// Number of non-finite values left out
    pub excluded: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single row
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    fn from_values(key: GroupKey, mut values: Vec<f64>) -> Result<Self> {
        let total = values.len();
        values.retain(|v| v.is_finite());
        let count = values.len();
        if count == 0 {
            return Err(Error::DegenerateInput(format!(
                "no finite values to summarize for {} ({total} non-finite)",
                key.kind
            )));
        }

        let mean = values.as_slice().mean();
        let std = (count > 1).then(|| values.as_slice().std_dev());
        let min = Statistics::min(values.as_slice());
        let max = Statistics::max(values.as_slice());

        let mut data = Data::new(values);
        Ok(Self {
            key,
            count,
            excluded: total - count,
            mean,
            std,
            min,
            q1: data.lower_quartile(),
            median: data.median(),
            q3: data.upper_quartile(),
            max,
        })
    }
}

/// How closely the two tests tracked each other across paired trials
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agreement {
    pub pairs: usize,
    pub max_statistic_diff: f64,
    pub mean_statistic_diff: f64,
    pub max_pvalue_diff: f64,
    pub mean_pvalue_diff: f64,
    pub max_ci_low_diff: f64,
    pub mean_ci_low_diff: f64,
    pub max_ci_high_diff: f64,
    pub mean_ci_high_diff: f64,
    /// Share of trials where both tests reached the same `stat_sig` verdict
    pub significance_agreement: f64,
}

#[derive(Default)]
struct DiffAccumulator {
    max: f64,
    sum: f64,
}

impl DiffAccumulator {
    fn push(&mut self, a: f64, b: f64) {
        // matching infinite bounds count as no difference
        let diff = if a == b { 0.0 } else { (a - b).abs() };
        self.max = self.max.max(diff);
        self.sum += diff;
    }

    fn mean(&self, n: usize) -> f64 {
        self.sum / n as f64
    }
}

impl SweepResult {
    /// Write all rows as CSV with a header
    ///
    /// Columns: `test, trial, statistic, pvalue, ci_low, ci_high, stat_sig,
    /// baseline_rate, mde, population, control_ratio`. Infinite one-sided
    /// bounds are written as `inf` / `-inf`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in self.rows() {
            csv.serialize(CsvRecord::from(row)).map_err(io::Error::from)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Summarize `metric` per test kind and the chosen design parameters
    ///
    /// Groups come back in key order. Non-finite values (the open side of a
    /// one-sided interval) are left out and counted in [`Summary::excluded`].
    ///
    /// Quartiles come from statrs' order statistics, which use the
    /// median-unbiased (R-8) quantile estimator. On small groups they differ
    /// from linear (R-7) interpolation: for `[1, 2, 3, 4]` the lower quartile
    /// is 1.4167 rather than 1.75.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateInput`] if a group has no finite values,
    /// e.g. `Metric::CiHigh` on a run with `Alternative::Larger`.
    pub fn summarize(&self, metric: Metric, grouping: &[GroupBy]) -> Result<Vec<Summary>> {
        let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
        for row in self.rows() {
            groups
                .entry(GroupKey::of(row, grouping))
                .or_default()
                .push(metric.value(row));
        }

        groups
            .into_iter()
            .map(|(key, values)| Summary::from_values(key, values))
            .collect()
    }

    /// Share of rows of `kind` flagged significant
    ///
    /// Under a true effect this is the empirical power of the test.
    pub fn significance_rate(&self, kind: TestKind) -> Option<f64> {
        let (hits, total) = self
            .rows()
            .iter()
            .filter(|row| row.kind == kind)
            .fold((0usize, 0usize), |(hits, total), row| {
                (hits + usize::from(row.stat_sig), total + 1)
            });
        (total > 0).then(|| hits as f64 / total as f64)
    }

    /// Compare the t-test with the proportion test trial by trial
    ///
    /// Returns `None` for an empty result.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if rows are not laid out as
    /// consecutive t-test / proportion-test pairs of the same trial.
    pub fn agreement(&self) -> Result<Option<Agreement>> {
        let rows = self.rows();
        if rows.len() % 2 != 0 {
            return Err(Error::InvalidParameter(format!(
                "{} rows cannot be paired by trial",
                rows.len()
            )));
        }
        if rows.is_empty() {
            return Ok(None);
        }

        let mut statistic = DiffAccumulator::default();
        let mut pvalue = DiffAccumulator::default();
        let mut ci_low = DiffAccumulator::default();
        let mut ci_high = DiffAccumulator::default();
        let mut agreeing = 0usize;

        for pair in rows.chunks_exact(2) {
            let (t, z) = (&pair[0], &pair[1]);
            if t.kind != TestKind::TTest
                || z.kind != TestKind::ProportionTest
                || t.trial != z.trial
                || t.design != z.design
            {
                return Err(Error::InvalidParameter(format!(
                    "rows for trial {} are not a t-test / proportion-test pair",
                    t.trial
                )));
            }
            statistic.push(t.statistic, z.statistic);
            pvalue.push(t.pvalue, z.pvalue);
            ci_low.push(t.ci_low, z.ci_low);
            ci_high.push(t.ci_high, z.ci_high);
            agreeing += usize::from(t.stat_sig == z.stat_sig);
        }

        let pairs = rows.len() / 2;
        Ok(Some(Agreement {
            pairs,
            max_statistic_diff: statistic.max,
            mean_statistic_diff: statistic.mean(pairs),
            max_pvalue_diff: pvalue.max,
            mean_pvalue_diff: pvalue.mean(pairs),
            max_ci_low_diff: ci_low.max,
            mean_ci_low_diff: ci_low.mean(pairs),
            max_ci_high_diff: ci_high.max,
            mean_ci_high_diff: ci_high.mean(pairs),
            significance_agreement: agreeing as f64 / pairs as f64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::TrialRunner;
    use approx::assert_abs_diff_eq;
    use retention_core::ExperimentDesign;
    use retention_hypothesis::{Alternative, TestConfig, TestStatisticEngine};

    fn design() -> ExperimentDesign {
        ExperimentDesign::new(0.6, 0.03, 6_000, 4.0).unwrap()
    }

    fn result() -> SweepResult {
        TrialRunner::new().run(&design(), 5, Some(3)).unwrap().into()
    }

    fn one_sided(alternative: Alternative) -> SweepResult {
        let config = TestConfig::default().with_alternative(alternative);
        TrialRunner::new()
            .with_tests(TestStatisticEngine::new(config))
            .run(&design(), 5, Some(3))
            .unwrap()
            .into()
    }

    fn key() -> GroupKey {
        GroupKey {
            kind: TestKind::TTest,
            baseline_rate: None,
            mde: None,
            population: None,
            control_ratio: None,
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let result = result();
        let mut out = Vec::new();
        result.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "test,trial,statistic,pvalue,ci_low,ci_high,stat_sig,baseline_rate,mde,population,control_ratio"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("t_test,0,"));
        assert!(first.ends_with(",0.6,0.03,6000,4.0"));
        assert_eq!(text.lines().count(), 1 + result.len());
    }

    #[test]
    fn test_summary_per_kind() {
        let result = result();
        let summaries = result.summarize(Metric::Pvalue, &[]).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key.kind, TestKind::TTest);
        assert_eq!(summaries[1].key.kind, TestKind::ProportionTest);

        for s in &summaries {
            assert_eq!(s.count, 5);
            assert_eq!(s.excluded, 0);
            assert!(s.std.is_some());
            assert!(s.min <= s.q1 && s.q1 <= s.median && s.median <= s.q3 && s.q3 <= s.max);
            assert!((0.0..=1.0).contains(&s.mean));
        }
    }

    #[test]
    fn test_summary_grouping_keys() {
        let summaries = result()
            .summarize(Metric::Statistic, &[GroupBy::ControlRatio])
            .unwrap();
        assert_eq!(summaries[0].key.control_ratio, Some(OrderedFloat(4.0)));
        assert_eq!(summaries[0].key.baseline_rate, None);
    }

    #[test]
    fn test_single_row_has_no_std() {
        let summary = Summary::from_values(key(), vec![2.5]).unwrap();
        assert_eq!(summary.std, None);
        assert_abs_diff_eq!(summary.median, 2.5);
        assert_abs_diff_eq!(summary.min, 2.5);
        assert_abs_diff_eq!(summary.max, 2.5);
    }

    #[test]
    fn test_quartiles_are_median_unbiased() {
        let summary = Summary::from_values(key(), vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_abs_diff_eq!(summary.q1, 1.416_667, epsilon = 1e-6);
        assert_abs_diff_eq!(summary.median, 2.5);
        assert_abs_diff_eq!(summary.q3, 3.583_333, epsilon = 1e-6);
    }

    #[test]
    fn test_summary_skips_infinite_bounds() {
        let summary = Summary::from_values(key(), vec![1.0, f64::INFINITY, 3.0]).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.excluded, 1);
        assert_abs_diff_eq!(summary.mean, 2.0);
        assert_abs_diff_eq!(summary.max, 3.0);
        assert!(summary.q1.is_finite() && summary.q3.is_finite());
        assert!(summary.std.unwrap().is_finite());
    }

    #[test]
    fn test_one_sided_summaries_never_nan() {
        let result = one_sided(Alternative::Larger);

        let err = result.summarize(Metric::CiHigh, &[]).unwrap_err();
        assert!(err.is_degenerate());

        for s in result.summarize(Metric::CiLow, &[]).unwrap() {
            assert_eq!(s.count, 5);
            assert_eq!(s.excluded, 0);
            assert!(s.mean.is_finite() && s.q1.is_finite() && s.q3.is_finite());
        }
    }

    #[test]
    fn test_agreement_compares_upper_bounds() {
        let agreement = one_sided(Alternative::Smaller).agreement().unwrap().unwrap();
        // every lower bound is -inf on both sides
        assert_eq!(agreement.max_ci_low_diff, 0.0);
        assert!(agreement.max_ci_high_diff > 0.0);
        assert!(agreement.max_ci_high_diff.is_finite());
        assert!(agreement.mean_ci_high_diff <= agreement.max_ci_high_diff);
    }

    #[test]
    fn test_agreement_report() {
        let agreement = result().agreement().unwrap().unwrap();
        assert_eq!(agreement.pairs, 5);
        assert!(agreement.max_statistic_diff >= agreement.mean_statistic_diff);
        assert!(agreement.max_pvalue_diff < 0.05);
        assert!(agreement.max_ci_low_diff > 0.0);
        assert!(agreement.max_ci_high_diff > 0.0);
        assert!((0.0..=1.0).contains(&agreement.significance_agreement));
    }

    #[test]
    fn test_agreement_empty() {
        let empty = SweepResult::from_batches(0, Vec::new());
        assert_eq!(empty.agreement().unwrap(), None);
        assert_eq!(empty.significance_rate(TestKind::TTest), None);
    }

    #[test]
    fn test_significance_rate_bounds() {
        let rate = result().significance_rate(TestKind::ProportionTest).unwrap();
        assert!((0.0..=1.0).contains(&rate));
    }
}
