//! Sufficient statistics consumed by the tests

use retention_core::{Error, Result};

/// Size, mean and unbiased variance of a numeric sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub n: u64,
    pub mean: f64,
    /// Sample variance with `n - 1` in the denominator
    pub variance: f64,
}

impl SampleSummary {
    /// Summarize a numeric sample with a two-pass mean/variance computation
    pub fn from_values(values: &[f64]) -> Self {
        Self::from_iter_twice(|| values.iter().copied(), values.len())
    }

    /// Summarize a sample of 0/1 outcomes treated as numbers
    pub fn from_binary(outcomes: &[u8]) -> Self {
        Self::from_iter_twice(|| outcomes.iter().map(|&x| f64::from(x)), outcomes.len())
    }

    fn from_iter_twice<I, F>(values: F, len: usize) -> Self
    where
        F: Fn() -> I,
        I: Iterator<Item = f64>,
    {
        if len == 0 {
            return Self {
                n: 0,
                mean: f64::NAN,
                variance: f64::NAN,
            };
        }

        let n = len as f64;
        let mean = values().sum::<f64>() / n;
        let variance = if len > 1 {
            values().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0)
        } else {
            f64::NAN
        };

        Self {
            n: len as u64,
            mean,
            variance,
        }
    }

    /// Squared standard error of the mean
    pub fn mean_variance(&self) -> f64 {
        self.variance / self.n as f64
    }
}

/// Success count out of a number of observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proportion {
    pub count: u64,
    pub nobs: u64,
}

impl Proportion {
    /// Create a proportion
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if `count > nobs`.
    pub fn new(count: u64, nobs: u64) -> Result<Self> {
        if count > nobs {
            return Err(Error::InvalidParameter(format!(
                "success count {count} exceeds observations {nobs}"
            )));
        }
        Ok(Self { count, nobs })
    }

    /// Observed success rate
    pub fn rate(&self) -> f64 {
        self.count as f64 / self.nobs as f64
    }

    /// Whether every outcome is identical
    pub fn is_constant(&self) -> bool {
        self.count == 0 || self.count == self.nobs
    }
}
