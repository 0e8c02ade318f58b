//! Tick path generators driving simulated swaps.

use crate::error::SimulationError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tick_vault_domain::math::{MAX_TICK, MIN_TICK};

/// Produces the sequence of ticks a simulated pool is swapped to.
pub trait TickPathGenerator {
    /// Returns the starting tick followed by `steps` further ticks.
    fn generate(&mut self, steps: usize) -> Vec<i32>;
}

/// Gaussian random walk over ticks, reproducible from its seed.
#[derive(Debug, Clone)]
pub struct GaussianTickWalk {
    pub initial_tick: i32,
    /// Mean tick change per step.
    pub drift: f64,
    /// Standard deviation of the tick change per step.
    pub volatility: f64,
    pub seed: u64,
    normal: Normal<f64>,
}

impl GaussianTickWalk {
    pub fn new(
        initial_tick: i32,
        drift: f64,
        volatility: f64,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        if !(MIN_TICK..=MAX_TICK).contains(&initial_tick) {
            return Err(SimulationError::InvalidParameter(format!(
                "initial tick {initial_tick} is out of bounds"
            )));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "volatility {volatility} must be finite and non-negative"
            )));
        }
        if !drift.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "drift {drift} must be finite"
            )));
        }
        let normal = Normal::new(drift, volatility).map_err(|e| {
            SimulationError::InvalidParameter(format!("volatility {volatility}: {e}"))
        })?;
        Ok(Self {
            initial_tick,
            drift,
            volatility,
            seed,
            normal,
        })
    }
}

impl TickPathGenerator for GaussianTickWalk {
    fn generate(&mut self, steps: usize) -> Vec<i32> {
        let mut ticks = Vec::with_capacity(steps + 1);
        ticks.push(self.initial_tick);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut current = f64::from(self.initial_tick);
        for _ in 0..steps {
            current += self.normal.sample(&mut rng);
            current = current.clamp(f64::from(MIN_TICK), f64::from(MAX_TICK));
            // Clamped to the tick bounds, so the cast cannot saturate.
            ticks.push(current.round() as i32);
        }

        ticks
    }
}

/// Replays a fixed list of ticks.
#[derive(Debug, Clone)]
pub struct DeterministicTickPath {
    pub ticks: Vec<i32>,
}

impl TickPathGenerator for DeterministicTickPath {
    fn generate(&mut self, _steps: usize) -> Vec<i32> {
        self.ticks.clone()
    }
}
