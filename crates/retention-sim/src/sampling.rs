//! Bernoulli sample generation and per-trial seeding

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Bernoulli, Distribution};
use retention_core::{Error, ExperimentDesign, Result};

/// 0/1 outcomes of one simulated group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySample {
    outcomes: Vec<u8>,
    successes: u64,
}

impl BinarySample {
    pub fn outcomes(&self) -> &[u8] {
        &self.outcomes
    }

    /// Number of ones, tracked while sampling
    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Observed success rate
    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.outcomes.len() as f64
    }
}

/// Draw `n` independent Bernoulli outcomes with success probability `p`
///
/// # Errors
/// Returns [`Error::InvalidParameter`] if `n` is zero or `p` is not a finite
/// value in `[0, 1]`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, n: usize, p: f64) -> Result<BinarySample> {
    if n == 0 {
        return Err(Error::InvalidParameter(
            "sample size must be at least 1".to_string(),
        ));
    }
    if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
        return Err(Error::invalid_probability("success probability", p));
    }
    let bernoulli =
        Bernoulli::new(p).map_err(|_| Error::invalid_probability("success probability", p))?;

    let mut outcomes = Vec::with_capacity(n);
    let mut successes = 0u64;
    for _ in 0..n {
        let hit = bernoulli.sample(rng);
        successes += u64::from(hit);
        outcomes.push(u8::from(hit));
    }

    Ok(BinarySample {
        outcomes,
        successes,
    })
}

/// Control and exposed samples drawn for one trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet {
    pub control: BinarySample,
    pub exposed: BinarySample,
}

impl SampleSet {
    /// Draw control at `baseline + mde` and exposed at `baseline`, in that
    /// order, from the same generator
    pub fn draw<R: Rng + ?Sized>(design: &ExperimentDesign, rng: &mut R) -> Result<Self> {
        let control = generate(rng, to_len(design.control_n())?, design.control_rate())?;
        let exposed = generate(rng, to_len(design.exposed_n())?, design.exposed_rate())?;
        Ok(Self { control, exposed })
    }
}

fn to_len(n: u64) -> Result<usize> {
    usize::try_from(n)
        .map_err(|_| Error::InvalidParameter(format!("sample size {n} does not fit in memory")))
}

/// Independent generator for trial `trial` of a batch seeded with `seed`
///
/// Every trial gets its own ChaCha stream, so trials can be drawn in any
/// order or on any thread and still produce the same samples.
pub fn trial_rng(seed: u64, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial as u64);
    rng
}

/// Batch seed of the `index`-th design of a sweep seeded with `seed`
pub fn design_seed(seed: u64, index: usize) -> u64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng.next_u64()
}

/// Fresh seed for runs that were not given one
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}
