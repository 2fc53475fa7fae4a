use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub init: InitConfig,
    pub output: OutputConfig,
}

/// Parameters of the game and of the Wright-Fisher dynamics.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Total number of senders (equal to the number of receivers).
    pub size: usize,
    /// Per-individual mutation probability.
    pub prob_mut: f64,
    /// Selection strength of the exponential fitness map.
    pub sel_strength: f64,

    pub low_sender: SenderConfig,
    pub high_sender: SenderConfig,
    pub low_receiver: ReceiverConfig,
    pub high_receiver: ReceiverConfig,
}

/// Payoff parameters of a sender type.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Cost of sending each signal (none, normal, hidden).
    pub costs: [f64; 3],
    /// Reward for being accepted by a low and by a high receiver.
    pub rates: [f64; 2],
}

/// Payoff parameters of a receiver type.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Reward for accepting a low and a high sender.
    pub rates: [f64; 2],
    /// Cost of investing.
    pub cost_inv: f64,
}

/// Initial population split.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    pub frac_low_senders: f64,
    pub frac_high_senders: f64,
    pub frac_low_receivers: f64,
    pub frac_high_receivers: f64,

    /// Seed of the random number generator (drawn from the OS if absent).
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of generations simulated per run invocation (may be 0).
    pub n_gens: usize,
    /// Number of generations between history records.
    pub gens_per_save: usize,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::parse(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check every parameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        self.model.validate().context("invalid model parameters")?;
        self.init.validate().context("invalid initial parameters")?;

        check_num(self.output.gens_per_save, 1..).context("invalid generations per save")?;

        Ok(())
    }
}

impl ModelConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.size, 1..).context("invalid population size")?;
        check_num(self.prob_mut, 0.0..=1.0).context("invalid mutation probability")?;
        check_finite(&[self.sel_strength]).context("invalid selection strength")?;

        for (name, sender) in [("low", &self.low_sender), ("high", &self.high_sender)] {
            check_finite(&sender.costs).with_context(|| format!("invalid {name} sender costs"))?;
            check_finite(&sender.rates).with_context(|| format!("invalid {name} sender rates"))?;
        }
        for (name, receiver) in [("low", &self.low_receiver), ("high", &self.high_receiver)] {
            check_finite(&receiver.rates)
                .with_context(|| format!("invalid {name} receiver rates"))?;
            check_finite(&[receiver.cost_inv])
                .with_context(|| format!("invalid {name} receiver investment cost"))?;
        }

        Ok(())
    }
}

impl InitConfig {
    fn validate(&self) -> Result<()> {
        check_split(&[self.frac_low_senders, self.frac_high_senders])
            .context("invalid sender fractions")?;
        check_split(&[self.frac_low_receivers, self.frac_high_receivers])
            .context("invalid receiver fractions")?;
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_finite(vals: &[f64]) -> Result<()> {
    if let Some(val) = vals.iter().find(|val| !val.is_finite()) {
        bail!("values must be finite, but found {val}");
    }
    Ok(())
}

fn check_split(fracs: &[f64]) -> Result<()> {
    for &frac in fracs {
        check_num(frac, 0.0..=1.0)?;
    }
    let sum: f64 = fracs.iter().sum();
    let tol = 1e-8;
    if (sum - 1.0).abs() > tol {
        bail!("fractions must sum to 1.0 (tolerance: {tol}), but sum to {sum}");
    }
    Ok(())
}
