//! Fitness of every individual and fitness-proportional parent selection.

use crate::config::ModelConfig;
use crate::model::State;
use crate::payoff::{receiver_payoff, sender_payoff};
use anyhow::{Result, bail};
use rand::Rng;

/// Exponential fitness map. Always positive for finite payoffs.
pub fn fitness(payoff: f64, sel_strength: f64) -> f64 {
    (sel_strength * payoff).exp()
}

/// Fitness of every individual of a generation, one sequence per subpopulation.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessTable {
    pub low_senders: Vec<f64>,
    pub high_senders: Vec<f64>,
    pub low_receivers: Vec<f64>,
    pub high_receivers: Vec<f64>,
}

impl FitnessTable {
    pub fn new(par: &ModelConfig, state: &State) -> Self {
        let sel = par.sel_strength;
        let (ls, hs) = (&state.low_senders, &state.high_senders);
        let (lr, hr) = (&state.low_receivers, &state.high_receivers);

        Self {
            low_senders: ls
                .iter()
                .map(|&sig| fitness(sender_payoff(sig, &par.low_sender, lr, hr, par.size), sel))
                .collect(),
            high_senders: hs
                .iter()
                .map(|&sig| fitness(sender_payoff(sig, &par.high_sender, lr, hr, par.size), sel))
                .collect(),
            low_receivers: lr
                .iter()
                .map(|&rec| fitness(receiver_payoff(rec, &par.low_receiver, ls, hs), sel))
                .collect(),
            high_receivers: hr
                .iter()
                .map(|&rec| fitness(receiver_payoff(rec, &par.high_receiver, ls, hs), sel))
                .collect(),
        }
    }
}

/// Roulette wheel over a fitness sequence.
///
/// Holds the normalized cumulative fitness `c_i`, so an index `i` is selected
/// when a uniform draw `u` satisfies `c_{i-1} <= u < c_i`. Zero weights
/// (exponential underflow) give empty slots that are never selected.
#[derive(Debug, Clone)]
pub struct Roulette {
    cum_fit: Vec<f64>,
    i_last: usize,
}

impl Roulette {
    /// Build the wheel, failing on an empty sequence, on a negative or NaN
    /// weight, or when the total fitness is zero or not finite.
    pub fn new(fit: &[f64]) -> Result<Self> {
        if fit.is_empty() {
            bail!("fitness sequence must not be empty");
        }
        if let Some((idx, val)) = fit.iter().enumerate().find(|(_, val)| !(**val >= 0.0)) {
            bail!("fitness must be non-negative, but element {idx} is {val}");
        }
        let total: f64 = fit.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            bail!("total fitness must be positive and finite, but is {total}");
        }
        let Some(i_last) = fit.iter().rposition(|&val| val > 0.0) else {
            bail!("fitness sequence has no positive element");
        };

        let mut partial = 0.0;
        let cum_fit = fit
            .iter()
            .map(|val| {
                partial += val;
                partial / total
            })
            .collect();

        Ok(Self { cum_fit, i_last })
    }

    /// Smallest index whose cumulative fitness exceeds `u`.
    ///
    /// Rounding may leave the last threshold slightly below 1,
    /// so draws past it fall back to the last index with positive fitness.
    pub fn select(&self, u: f64) -> usize {
        let idx = self.cum_fit.partition_point(|&cum| cum <= u);
        idx.min(self.i_last)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.select(rng.random())
    }
}
