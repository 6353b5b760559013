//! Configuration shared by both hypothesis tests

use retention_core::{Error, Result};
use std::fmt;

/// Alternative hypothesis for the difference `group1 - group2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alternative {
    /// `group1 != group2`
    #[default]
    TwoSided,
    /// `group1 > group2`
    Larger,
    /// `group1 < group2`
    Smaller,
}

impl Alternative {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TwoSided => "two-sided",
            Self::Larger => "larger",
            Self::Smaller => "smaller",
        }
    }

    pub fn is_one_sided(&self) -> bool {
        !matches!(self, Self::TwoSided)
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Alternative and confidence level for a test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestConfig {
    alternative: Alternative,
    confidence_level: f64,
}

impl TestConfig {
    pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

    /// Create a validated configuration
    pub fn new(alternative: Alternative, confidence_level: f64) -> Result<Self> {
        Self::default()
            .with_alternative(alternative)
            .with_confidence_level(confidence_level)
    }

    /// Set the alternative hypothesis
    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    /// Set the confidence level
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if the level is not in (0, 1).
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Result<Self> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Confidence level {confidence_level} must be in (0, 1)"
            )));
        }
        self.confidence_level = confidence_level;
        Ok(self)
    }

    pub fn alternative(&self) -> Alternative {
        self.alternative
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Get the alpha level (1 - confidence level)
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_level
    }

    /// Upper-tail probability whose quantile gives the interval's critical value
    pub(crate) fn critical_probability(&self) -> f64 {
        match self.alternative {
            Alternative::TwoSided => 1.0 - self.alpha() / 2.0,
            Alternative::Larger | Alternative::Smaller => 1.0 - self.alpha(),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alternative: Alternative::TwoSided,
            confidence_level: Self::DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}
