//! Hypothesis tests for retention experiments
//!
//! This crate reproduces two named tests and their confidence intervals:
//!
//! - **Welch's t-test** ([`WelchTTest`]): unequal-variance two-sample t-test
//!   with Satterthwaite degrees of freedom
//! - **Two-independent-proportions z-test** ([`ProportionsZTest`]): normal
//!   approximation for `p1 - p2`, with a Newcombe (Wilson score based)
//!   interval by default
//!
//! [`TestStatisticEngine`] runs both on the same 0/1 data so their
//! statistics, p-values and intervals can be compared directly, and
//! [`CohortTestRunner`] applies the proportions test to aggregated cohort
//! retention counts.
//!
//! Inputs for which a statistic is undefined (empty groups, all-identical
//! outcomes) are rejected with [`retention_core::Error::DegenerateInput`]
//! instead of producing NaN.
//!
//! # Example
//!
//! ```rust
//! use retention_hypothesis::{Alternative, Proportion, ProportionsZTest, TestConfig};
//!
//! let config = TestConfig::default().with_alternative(Alternative::Larger);
//! let outcome = ProportionsZTest::new(config)
//!     .test(
//!         &Proportion::new(6_350, 10_000).unwrap(),
//!         &Proportion::new(6_150, 10_000).unwrap(),
//!     )
//!     .unwrap();
//!
//! assert!(outcome.pvalue < 0.01);
//! assert_eq!(outcome.interval.upper, f64::INFINITY);
//! ```

pub mod cohort;
mod config;
mod engine;
mod interval;
mod outcome;
mod proportions;
mod summary;
mod welch;

pub use cohort::{CohortRow, CohortTestRunner, GroupTotals, PeriodTest};
pub use config::{Alternative, TestConfig};
pub use engine::{PairedOutcome, TestStatisticEngine};
pub use interval::ConfidenceInterval;
pub use outcome::{TestKind, TestOutcome};
pub use proportions::{wilson_score_interval, IntervalMethod, ProportionsZTest, ZTestMethod};
pub use summary::{Proportion, SampleSummary};
pub use welch::WelchTTest;
