//! Experiment designs for imbalanced retention A/B tests

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// An immutable experiment design
///
/// The population is split into a small control segment and a large exposed
/// segment according to `control_ratio` (exposed:control). The control group
/// converts at `baseline_rate + minimum_detectable_effect`, the exposed group
/// at `baseline_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExperimentDesign {
    baseline_rate: f64,
    minimum_detectable_effect: f64,
    population: u64,
    control_ratio: f64,
    #[serde(skip)]
    control_n: u64,
}

impl ExperimentDesign {
    /// Create a validated design
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] when the baseline rate is not in
    /// (0, 1), the control success probability leaves [0, 1], the ratio is
    /// below 1, or either segment would be empty.
    pub fn new(
        baseline_rate: f64,
        minimum_detectable_effect: f64,
        population: u64,
        control_ratio: f64,
    ) -> Result<Self> {
        if !baseline_rate.is_finite() || baseline_rate <= 0.0 || baseline_rate >= 1.0 {
            return Err(Error::InvalidParameter(format!(
                "baseline_rate {baseline_rate} must be in (0, 1)"
            )));
        }
        if !minimum_detectable_effect.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "minimum detectable effect {minimum_detectable_effect} must be finite"
            )));
        }
        let control_rate = baseline_rate + minimum_detectable_effect;
        if !(0.0..=1.0).contains(&control_rate) {
            return Err(Error::invalid_probability("control success probability", control_rate));
        }
        if population == 0 {
            return Err(Error::InvalidParameter(
                "population must be positive".to_string(),
            ));
        }
        if !control_ratio.is_finite() || control_ratio < 1.0 {
            return Err(Error::InvalidParameter(format!(
                "control_ratio {control_ratio} must be a finite value >= 1"
            )));
        }

        let control_n = (population as f64 / control_ratio).ceil() as u64;
        if control_n < 1 || control_n >= population {
            return Err(Error::InvalidParameter(format!(
                "population {population} with control_ratio {control_ratio} leaves an empty segment \
                 (control_n={control_n})"
            )));
        }

        Ok(Self {
            baseline_rate,
            minimum_detectable_effect,
            population,
            control_ratio,
            control_n,
        })
    }

    pub fn baseline_rate(&self) -> f64 {
        self.baseline_rate
    }

    pub fn minimum_detectable_effect(&self) -> f64 {
        self.minimum_detectable_effect
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn control_ratio(&self) -> f64 {
        self.control_ratio
    }

    /// Control segment size, `ceil(population / control_ratio)`
    pub fn control_n(&self) -> u64 {
        self.control_n
    }

    /// Exposed segment size, `population - control_n`
    pub fn exposed_n(&self) -> u64 {
        self.population - self.control_n
    }

    /// Success probability of the control segment
    pub fn control_rate(&self) -> f64 {
        self.baseline_rate + self.minimum_detectable_effect
    }

    /// Success probability of the exposed segment
    pub fn exposed_rate(&self) -> f64 {
        self.baseline_rate
    }
}

impl fmt::Display for ExperimentDesign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "baseline_rate={}, mde={}, population={}, control_ratio={}",
            self.baseline_rate, self.minimum_detectable_effect, self.population, self.control_ratio
        )
    }
}
