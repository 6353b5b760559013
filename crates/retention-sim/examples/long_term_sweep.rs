//! Sweep retention holdout designs with one-sided `larger` tests and compare
//! the t-test with the proportion test
//!
//! Two grids are available:
//!
//! - `long` (default): new subscribers, 175k-225k users, 5.66:1 to 19:1
//!   exposed to control, 50 trials per design
//! - `short`: existing subscribers, 2.75M-3.25M users, 19:1 to 49:1,
//!   500 trials per design
//!
//! ```text
//! RUST_LOG=retention_sim=debug cargo run --release -p retention-sim \
//!     --example long_term_sweep -- long 50 results.csv
//! ```

use anyhow::{bail, Context};
use retention_hypothesis::{Alternative, TestConfig, TestKind, TestStatisticEngine};
use retention_sim::{GroupBy, Metric, SweepGrid, SweepRunner, TrialRunner};
use std::fs::File;
use std::io::BufWriter;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (grid, default_trials) = match args.next().as_deref() {
        None | Some("long") => (SweepGrid::long_term(), 50),
        Some("short") => (SweepGrid::short_term(), 500),
        Some(other) => bail!("unknown grid '{other}', expected 'long' or 'short'"),
    };
    let trials: usize = match args.next() {
        Some(arg) => arg.parse().context("trial count must be a positive integer")?,
        None => default_trials,
    };
    let output = args.next();

    let config = TestConfig::default().with_alternative(Alternative::Larger);
    let runner = SweepRunner::new()
        .with_trial_runner(TrialRunner::new().with_tests(TestStatisticEngine::new(config)));
    let result = runner.run(&grid, trials, None)?;
    println!("{} designs, {} rows, sweep seed {}", grid.len(), result.len(), result.seed());

    for kind in [TestKind::TTest, TestKind::ProportionTest] {
        if let Some(rate) = result.significance_rate(kind) {
            println!("{kind}: significant in {:.1}% of trials", rate * 100.0);
        }
    }

    println!("\nlower CI bound by baseline rate:");
    for summary in result.summarize(Metric::CiLow, &[GroupBy::BaselineRate])? {
        println!(
            "  {:<16} baseline={:<5} mean={:.5} q1={:.5} median={:.5} q3={:.5}",
            summary.key.kind,
            summary.key.baseline_rate.map(|b| b.0).unwrap_or_default(),
            summary.mean,
            summary.q1,
            summary.median,
            summary.q3,
        );
    }

    if let Some(agreement) = result.agreement()? {
        println!(
            "\nagreement over {} trials: max |dt| {:.4}, max |dp| {:.5}, \
             max |d ci_low| {:.5}, max |d ci_high| {:.5}, same verdict {:.1}%",
            agreement.pairs,
            agreement.max_statistic_diff,
            agreement.max_pvalue_diff,
            agreement.max_ci_low_diff,
            agreement.max_ci_high_diff,
            agreement.significance_agreement * 100.0
        );
    }

    if let Some(path) = output {
        let file = File::create(&path).with_context(|| format!("creating {path}"))?;
        result.write_csv(BufWriter::new(file))?;
        println!("\nwrote {} rows to {path}", result.len());
    }
    Ok(())
}
