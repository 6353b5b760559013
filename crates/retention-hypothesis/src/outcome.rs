//! Test outcomes and the reference distributions behind them

use crate::{Alternative, ConfidenceInterval};
use retention_core::{Error, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::fmt;

/// Which hypothesis test produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Welch two-sample t-test
    TTest,
    /// Two-independent-proportions z-test
    ProportionTest,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TTest => "t_test",
            Self::ProportionTest => "proportion_test",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Statistic, p-value and interval from one test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub kind: TestKind,
    pub statistic: f64,
    pub pvalue: f64,
    pub interval: ConfidenceInterval,
    /// Satterthwaite degrees of freedom (t-test only)
    pub degrees_of_freedom: Option<f64>,
}

impl TestOutcome {
    /// Whether the p-value is at or below `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.pvalue <= alpha
    }
}

/// Reference distribution of a test statistic under the null
#[derive(Debug, Clone)]
pub(crate) enum Reference {
    Normal(Normal),
    StudentsT(StudentsT),
}

impl Reference {
    pub(crate) fn standard_normal() -> Result<Self> {
        Normal::new(0.0, 1.0)
            .map(Self::Normal)
            .map_err(|e| Error::Computation(format!("Failed to create normal distribution: {e}")))
    }

    pub(crate) fn students_t(df: f64) -> Result<Self> {
        if !(df.is_finite() && df > 0.0) {
            return Err(Error::non_finite("degrees of freedom"));
        }
        StudentsT::new(0.0, 1.0, df)
            .map(Self::StudentsT)
            .map_err(|e| Error::Computation(format!("Failed to create t-distribution: {e}")))
    }

    fn cdf(&self, x: f64) -> f64 {
        match self {
            Self::Normal(d) => d.cdf(x),
            Self::StudentsT(d) => d.cdf(x),
        }
    }

    /// Upper tail through symmetry, which keeps tiny tail areas exact
    fn sf(&self, x: f64) -> f64 {
        self.cdf(-x)
    }

    pub(crate) fn inverse_cdf(&self, p: f64) -> f64 {
        match self {
            Self::Normal(d) => d.inverse_cdf(p),
            Self::StudentsT(d) => d.inverse_cdf(p),
        }
    }

    /// P-value of `statistic` for the given alternative, clamped to [0, 1]
    pub(crate) fn pvalue(&self, statistic: f64, alternative: Alternative) -> f64 {
        let p = match alternative {
            Alternative::TwoSided => 2.0 * self.sf(statistic.abs()),
            Alternative::Larger => self.sf(statistic),
            Alternative::Smaller => self.cdf(statistic),
        };
        p.clamp(0.0, 1.0)
    }
}

/// Interval `estimate ∓ margin` shaped by the alternative
pub(crate) fn interval_from_margin(
    estimate: f64,
    margin: f64,
    alternative: Alternative,
    confidence_level: f64,
) -> ConfidenceInterval {
    let (lower, upper) = match alternative {
        Alternative::TwoSided => (estimate - margin, estimate + margin),
        Alternative::Larger => (estimate - margin, f64::INFINITY),
        Alternative::Smaller => (f64::NEG_INFINITY, estimate + margin),
    };
    ConfidenceInterval::new(lower, upper, estimate, confidence_level)
}
