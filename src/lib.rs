//! Retention experiment statistics
//!
//! This crate re-exports the workspace members:
//!
//! - [`retention_core`]: errors, [`ExperimentDesign`] and execution engines
//! - [`retention_hypothesis`]: Welch t-test, two-proportion z-test,
//!   confidence intervals and the cohort runner
//! - [`retention_sim`]: Monte Carlo trials and parameter sweeps comparing the
//!   two tests
//!
//! # Example
//!
//! ```rust
//! use retention_stats::prelude::*;
//!
//! let design = ExperimentDesign::new(0.615, 0.02, 200_000, 19.0).unwrap();
//! let batch = TrialRunner::new().run(&design, 3, Some(7)).unwrap();
//! assert_eq!(batch.rows().len(), 6);
//! ```

pub use retention_core;
pub use retention_hypothesis;
pub use retention_sim;

pub use retention_core::{Error, ExperimentDesign, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use retention_hypothesis::{
        CohortRow, CohortTestRunner, IntervalMethod, Proportion, ProportionsZTest, WelchTTest,
        ZTestMethod,
    };
    pub use retention_sim::prelude::*;
}
