//! Monte Carlo simulation of imbalanced retention experiments
//!
//! For each [`ExperimentDesign`](retention_core::ExperimentDesign) the
//! simulation repeatedly draws Bernoulli samples for a small control group and
//! a large exposed group, runs a Welch t-test and a proportions z-test on the
//! same data, and records both outcomes. Sweeping over baseline rates,
//! effect sizes, populations and control ratios shows where the two tests
//! diverge.
//!
//! - [`sampling`]: Bernoulli sample generation and reproducible seeding
//! - [`TrialRunner`]: N trials of one design
//! - [`SweepRunner`]: a [`TrialRunner`] over the Cartesian product of a
//!   [`SweepGrid`]
//! - [`SweepResult`]: the combined rows, with CSV export, grouped summaries
//!   and a t-test / z-test agreement report
//!
//! Runs are reproducible from their seed. With the `parallel` feature, trials
//! and designs can be spread over a Rayon pool by passing a
//! `ParallelEngine` to [`TrialRunner::with_engine`] or
//! [`SweepRunner::with_engine`]; results are identical to a sequential run.
//!
//! # Example
//!
//! ```rust
//! use retention_sim::{SweepGrid, SweepRunner};
//!
//! let grid = SweepGrid::new([0.615], [0.02], [20_000], [19.0]);
//! let result = SweepRunner::new().run(&grid, 3, Some(42)).unwrap();
//! assert_eq!(result.len(), 6);
//! ```

mod report;
pub mod sampling;
mod sweep;
mod trial;

pub use report::{Agreement, GroupBy, GroupKey, Metric, Summary};
pub use sampling::{generate, BinarySample, SampleSet};
pub use sweep::{SweepGrid, SweepResult, SweepRunner};
pub use trial::{TestResult, TrialBatch, TrialRunner};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        GroupBy, Metric, SweepGrid, SweepResult, SweepRunner, TestResult, TrialBatch, TrialRunner,
    };
    pub use retention_core::prelude::*;
    pub use retention_hypothesis::{Alternative, TestConfig, TestKind, TestStatisticEngine};
}
