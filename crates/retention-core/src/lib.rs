//! Core types for retention experiment simulation
//!
//! This crate provides the pieces every other retention-stats crate builds on:
//!
//! - [`Error`] / [`Result`]: the unified error taxonomy, including design
//!   context attached to failures deep inside a sweep
//! - [`ExperimentDesign`]: a validated, immutable A/B test design
//! - [`execution`]: sequential and (with the `parallel` feature) Rayon-backed
//!   engines that run independent work items in index order
//!
//! # Example
//!
//! ```rust
//! use retention_core::ExperimentDesign;
//!
//! let design = ExperimentDesign::new(0.615, 0.02, 200_000, 19.0).unwrap();
//! assert_eq!(design.control_n(), 10_527);
//! assert_eq!(design.exposed_n(), 189_473);
//! ```

pub mod design;
pub mod error;
pub mod execution;

pub use design::ExperimentDesign;
pub use error::{Error, Result};
pub use execution::{sequential, ExecutionEngine, ExecutionStrategy, SequentialEngine};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        sequential, Error, ExecutionEngine, ExecutionStrategy, ExperimentDesign, Result,
        SequentialEngine,
    };

    #[cfg(feature = "parallel")]
    pub use crate::{parallel, ParallelEngine};
}
