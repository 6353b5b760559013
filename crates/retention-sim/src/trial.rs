//! Repeated sampling and testing of a single design

use crate::sampling::{random_seed, trial_rng, SampleSet};
use retention_core::{Error, ExecutionEngine, ExperimentDesign, Result, SequentialEngine};
use retention_hypothesis::{TestKind, TestOutcome, TestStatisticEngine};
use tracing::{debug, instrument};

/// One test's outcome on one simulated trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub trial: usize,
    pub kind: TestKind,
    pub statistic: f64,
    pub pvalue: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// `pvalue <= significance_level`
    pub stat_sig: bool,
    pub design: ExperimentDesign,
}

impl TestResult {
    fn from_outcome(
        trial: usize,
        outcome: &TestOutcome,
        significance_level: f64,
        design: ExperimentDesign,
    ) -> Self {
        Self {
            trial,
            kind: outcome.kind,
            statistic: outcome.statistic,
            pvalue: outcome.pvalue,
            ci_low: outcome.interval.lower,
            ci_high: outcome.interval.upper,
            stat_sig: outcome.is_significant(significance_level),
            design,
        }
    }
}

/// All rows produced for one design
///
/// Trial `i` contributes row `2i` (t-test) and row `2i + 1` (proportion
/// test).
#[derive(Debug, Clone, PartialEq)]
pub struct TrialBatch {
    design: ExperimentDesign,
    seed: u64,
    rows: Vec<TestResult>,
}

impl TrialBatch {
    pub fn design(&self) -> &ExperimentDesign {
        &self.design
    }

    /// Seed that reproduces this batch
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rows(&self) -> &[TestResult] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<TestResult> {
        self.rows
    }

    pub fn trial_count(&self) -> usize {
        self.rows.len() / 2
    }

    /// Rows of a single test kind, in trial order
    pub fn of_kind(&self, kind: TestKind) -> impl Iterator<Item = &TestResult> + '_ {
        self.rows.iter().filter(move |row| row.kind == kind)
    }
}

/// Runs N independent trials of one design
///
/// Each trial draws a fresh [`SampleSet`] and runs both tests of the
/// configured [`TestStatisticEngine`] on it.
#[derive(Debug, Clone)]
pub struct TrialRunner<E: ExecutionEngine = SequentialEngine> {
    engine: E,
    tests: TestStatisticEngine,
    significance_level: f64,
}

impl TrialRunner<SequentialEngine> {
    pub fn new() -> Self {
        Self {
            engine: SequentialEngine::new(),
            tests: TestStatisticEngine::default(),
            significance_level: Self::DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl Default for TrialRunner<SequentialEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExecutionEngine> TrialRunner<E> {
    pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

    /// Run trials on a different execution engine
    pub fn with_engine<E2: ExecutionEngine>(self, engine: E2) -> TrialRunner<E2> {
        TrialRunner {
            engine,
            tests: self.tests,
            significance_level: self.significance_level,
        }
    }

    /// Use custom test settings (alternative, confidence level, methods)
    pub fn with_tests(mut self, tests: TestStatisticEngine) -> Self {
        self.tests = tests;
        self
    }

    /// Threshold at or below which a p-value is flagged `stat_sig`
    pub fn with_significance_level(mut self, significance_level: f64) -> Result<Self> {
        if !(significance_level > 0.0 && significance_level < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "significance level {significance_level} must be in (0, 1)"
            )));
        }
        self.significance_level = significance_level;
        Ok(self)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tests(&self) -> &TestStatisticEngine {
        &self.tests
    }

    pub fn significance_level(&self) -> f64 {
        self.significance_level
    }

    /// Run `trial_count` trials of `design`
    ///
    /// With `seed = None` a seed is drawn at random and recorded on the
    /// returned batch.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] for `trial_count == 0` and stops at
    /// the first failing trial. Every error carries `design` as context.
    #[instrument(level = "debug", skip(self, design), fields(design = %design))]
    pub fn run(
        &self,
        design: &ExperimentDesign,
        trial_count: usize,
        seed: Option<u64>,
    ) -> Result<TrialBatch> {
        if trial_count == 0 {
            return Err(Error::InvalidParameter(
                "trial count must be at least 1".to_string(),
            )
            .with_design(design));
        }
        let seed = seed.unwrap_or_else(random_seed);

        let pairs = self
            .engine
            .try_execute_batch(trial_count, |trial| self.run_trial(design, seed, trial))
            .map_err(|e| e.with_design(design))?;

        let rows: Vec<TestResult> = pairs.into_iter().flatten().collect();
        let significant =
            |kind: TestKind| rows.iter().filter(|r| r.kind == kind && r.stat_sig).count();
        debug!(
            trials = trial_count,
            seed,
            t_test_significant = significant(TestKind::TTest),
            proportion_test_significant = significant(TestKind::ProportionTest),
            "trial batch complete"
        );

        Ok(TrialBatch {
            design: *design,
            seed,
            rows,
        })
    }

    fn run_trial(
        &self,
        design: &ExperimentDesign,
        seed: u64,
        trial: usize,
    ) -> Result<[TestResult; 2]> {
        let mut rng = trial_rng(seed, trial);
        let samples = SampleSet::draw(design, &mut rng)?;
        let paired = self.tests.compare_binary_counted(
            samples.control.outcomes(),
            samples.control.successes(),
            samples.exposed.outcomes(),
            samples.exposed.successes(),
        )?;

        Ok([
            TestResult::from_outcome(trial, &paired.t_test, self.significance_level, *design),
            TestResult::from_outcome(
                trial,
                &paired.proportion_test,
                self.significance_level,
                *design,
            ),
        ])
    }
}
