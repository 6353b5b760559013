//! Cartesian-product parameter sweeps

use crate::sampling::{design_seed, random_seed};
use crate::trial::{TestResult, TrialBatch, TrialRunner};
use retention_core::{Error, ExecutionEngine, ExperimentDesign, Result, SequentialEngine};
use tracing::{info, instrument};

/// Parameter lists whose Cartesian product forms the designs of a sweep
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepGrid {
    pub baseline_rates: Vec<f64>,
    pub mdes: Vec<f64>,
    pub populations: Vec<u64>,
    pub control_ratios: Vec<f64>,
}

impl SweepGrid {
    pub fn new(
        baseline_rates: impl Into<Vec<f64>>,
        mdes: impl Into<Vec<f64>>,
        populations: impl Into<Vec<u64>>,
        control_ratios: impl Into<Vec<f64>>,
    ) -> Self {
        Self {
            baseline_rates: baseline_rates.into(),
            mdes: mdes.into(),
            populations: populations.into(),
            control_ratios: control_ratios.into(),
        }
    }

    /// New-subscriber retention: 175k-225k users, 5.66:1 to 19:1 exposed to
    /// control
    pub fn long_term() -> Self {
        Self::new(
            [0.55, 0.60, 0.65],
            [0.02, 0.03, 0.04],
            [175_000, 200_000, 225_000],
            [5.66, 9.0, 19.0],
        )
    }

    /// Existing-subscriber retention: 2.75M-3.25M users, 19:1 to 49:1
    pub fn short_term() -> Self {
        Self::new(
            [0.85, 0.90, 0.95],
            [0.01, 0.02, 0.03],
            [2_750_000, 3_000_000, 3_250_000],
            [19.0, 32.33, 49.0],
        )
    }

    /// Number of designs in the product
    pub fn len(&self) -> usize {
        self.baseline_rates.len()
            * self.mdes.len()
            * self.populations.len()
            * self.control_ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build and validate every design, baseline rate outermost and control
    /// ratio innermost
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if any list is empty or any
    /// combination is not a valid design.
    pub fn designs(&self) -> Result<Vec<ExperimentDesign>> {
        for (name, len) in [
            ("baseline_rates", self.baseline_rates.len()),
            ("mdes", self.mdes.len()),
            ("populations", self.populations.len()),
            ("control_ratios", self.control_ratios.len()),
        ] {
            if len == 0 {
                return Err(Error::InvalidParameter(format!(
                    "sweep parameter list '{name}' is empty"
                )));
            }
        }

        let mut designs = Vec::with_capacity(self.len());
        for &baseline_rate in &self.baseline_rates {
            for &mde in &self.mdes {
                for &population in &self.populations {
                    for &control_ratio in &self.control_ratios {
                        designs.push(ExperimentDesign::new(
                            baseline_rate,
                            mde,
                            population,
                            control_ratio,
                        )?);
                    }
                }
            }
        }
        Ok(designs)
    }
}

/// Runs a [`TrialRunner`] over every design of a [`SweepGrid`]
#[derive(Debug, Clone)]
pub struct SweepRunner<E: ExecutionEngine = SequentialEngine> {
    trials: TrialRunner<E>,
}

impl SweepRunner<SequentialEngine> {
    pub fn new() -> Self {
        Self {
            trials: TrialRunner::new(),
        }
    }
}

impl Default for SweepRunner<SequentialEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExecutionEngine> SweepRunner<E> {
    /// Sweep with a custom trial runner (engine, tests, significance level)
    pub fn with_trial_runner<E2: ExecutionEngine>(
        self,
        trials: TrialRunner<E2>,
    ) -> SweepRunner<E2> {
        SweepRunner { trials }
    }

    /// Run designs and their trials on a different execution engine
    pub fn with_engine<E2: ExecutionEngine>(self, engine: E2) -> SweepRunner<E2> {
        SweepRunner {
            trials: self.trials.with_engine(engine),
        }
    }

    pub fn trial_runner(&self) -> &TrialRunner<E> {
        &self.trials
    }

    /// Run `trial_count` trials for every design of `grid`
    ///
    /// All designs are validated before any sampling starts. Each design's
    /// batch seed is derived from the sweep seed and the design's position
    /// in the product, so a sweep replays exactly from [`SweepResult::seed`].
    ///
    /// # Errors
    /// Fails on an invalid grid, `trial_count == 0`, or the first failing
    /// design (attached to the error).
    #[instrument(level = "debug", skip(self, grid), fields(designs = grid.len()))]
    pub fn run(
        &self,
        grid: &SweepGrid,
        trial_count: usize,
        seed: Option<u64>,
    ) -> Result<SweepResult> {
        let designs = grid.designs()?;
        if trial_count == 0 {
            return Err(Error::InvalidParameter(
                "trial count must be at least 1".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(random_seed);

        let batches = self.trials.engine().try_execute_batch(designs.len(), |index| {
            self.trials
                .run(&designs[index], trial_count, Some(design_seed(seed, index)))
        })?;

        let result = SweepResult::from_batches(seed, batches);
        info!(
            designs = designs.len(),
            trials = trial_count,
            rows = result.len(),
            seed,
            "sweep complete"
        );
        Ok(result)
    }
}

/// Every row of a sweep, design by design in grid order
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    seed: u64,
    rows: Vec<TestResult>,
}

impl SweepResult {
    /// Concatenate batches in the given order
    pub fn from_batches(seed: u64, batches: impl IntoIterator<Item = TrialBatch>) -> Self {
        let mut rows = Vec::new();
        for batch in batches {
            rows.extend(batch.into_rows());
        }
        Self { seed, rows }
    }

    /// Seed that reproduces the sweep
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rows(&self) -> &[TestResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<TrialBatch> for SweepResult {
    fn from(batch: TrialBatch) -> Self {
        let seed = batch.seed();
        Self {
            seed,
            rows: batch.into_rows(),
        }
    }
}
