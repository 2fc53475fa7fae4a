use crate::config::{Config, ModelConfig};
use crate::fitness::{FitnessTable, Roulette};
use crate::model::{Record, State};
use crate::strategy::{Receiver, Signal};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Uniform};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, current population, generation counter and
/// random number generator, and provides methods to initialize, run, save,
/// and load simulations.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    state: State,
    i_gen: usize,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial population.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;

        let mut rng = match cfg.init.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let state = initialize(&cfg, &mut rng).context("failed to initialize population")?;

        Ok(Self {
            cfg,
            state,
            i_gen: 0,
            rng,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Number of generations simulated so far.
    pub fn i_gen(&self) -> usize {
        self.i_gen
    }

    /// Advance the population by `n_gens` generations.
    ///
    /// A [`Record`] is passed to `on_save` whenever the total generation count
    /// is a multiple of `gens_per_save`, so the stride carries over resumed runs.
    pub fn run<F>(&mut self, n_gens: usize, mut on_save: F) -> Result<()>
    where
        F: FnMut(&Record) -> Result<()>,
    {
        let gens_per_save = self.cfg.output.gens_per_save;
        for _ in 0..n_gens {
            self.state = step(&self.cfg.model, &self.state, &mut self.rng)
                .with_context(|| format!("failed to perform generation {}", self.i_gen))?;
            self.i_gen += 1;

            if self.i_gen % gens_per_save == 0 {
                let record = Record {
                    i_gen: self.i_gen,
                    props: self.state.proportions(),
                };
                on_save(&record).context("failed to save record")?;
            }
        }
        Ok(())
    }

    /// Advance the population by `n_gens` generations and collect the records.
    pub fn history(&mut self, n_gens: usize) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        self.run(n_gens, |record| {
            records.push(record.clone());
            Ok(())
        })?;
        Ok(records)
    }

    /// Perform the simulation and save the resulting records to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let n_gens = self.cfg.output.n_gens;
        let i_gen_start = self.i_gen;
        self.run(n_gens, |record| {
            encode::write(&mut writer, record).context("failed to serialize record")?;

            let progress = 100.0 * (record.i_gen - i_gen_start) as f64 / n_gens as f64;
            log::info!("completed {progress:06.2}%");
            Ok(())
        })?;

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }
}

/// Draw a random initial population.
///
/// Individual `i` of `0..size` is a low sender if `i < frac_low_senders * size`
/// and a high sender otherwise; receivers are split the same way by their own fraction.
pub fn initialize<R: Rng + ?Sized>(cfg: &Config, rng: &mut R) -> Result<State> {
    let size = cfg.model.size;
    let cut_senders = cfg.init.frac_low_senders * size as f64;
    let cut_receivers = cfg.init.frac_low_receivers * size as f64;

    let sig_dist = Uniform::new(0, Signal::ALL.len())?;
    let rec_dist = Uniform::new(0, Receiver::ALL.len())?;

    let mut state = State {
        low_senders: Vec::new(),
        high_senders: Vec::new(),
        low_receivers: Vec::new(),
        high_receivers: Vec::new(),
    };

    for i_ind in 0..size {
        let signal = Signal::ALL[sig_dist.sample(rng)];
        if (i_ind as f64) < cut_senders {
            state.low_senders.push(signal);
        } else {
            state.high_senders.push(signal);
        }

        let receiver = Receiver::ALL[rec_dist.sample(rng)];
        if (i_ind as f64) < cut_receivers {
            state.low_receivers.push(receiver);
        } else {
            state.high_receivers.push(receiver);
        }
    }

    Ok(state)
}

/// Produce the next generation by Wright-Fisher sampling with mutation.
///
/// Subpopulations are updated in order (low senders, high senders, low
/// receivers, high receivers), which fixes the order of random draws.
pub fn step<R: Rng + ?Sized>(par: &ModelConfig, state: &State, rng: &mut R) -> Result<State> {
    let table = FitnessTable::new(par, state);
    let mut_dist = Bernoulli::new(par.prob_mut)?;

    let (sig, rec) = (&Signal::ALL, &Receiver::ALL);

    let low_senders = offspring(&state.low_senders, &table.low_senders, sig, &mut_dist, rng)
        .context("failed to reproduce low senders")?;
    let high_senders = offspring(&state.high_senders, &table.high_senders, sig, &mut_dist, rng)
        .context("failed to reproduce high senders")?;
    let low_receivers =
        offspring(&state.low_receivers, &table.low_receivers, rec, &mut_dist, rng)
            .context("failed to reproduce low receivers")?;
    let high_receivers =
        offspring(&state.high_receivers, &table.high_receivers, rec, &mut_dist, rng)
            .context("failed to reproduce high receivers")?;

    Ok(State {
        low_senders,
        high_senders,
        low_receivers,
        high_receivers,
    })
}

fn offspring<T: Copy, R: Rng + ?Sized>(
    parents: &[T],
    fit: &[f64],
    strategies: &[T],
    mut_dist: &Bernoulli,
    rng: &mut R,
) -> Result<Vec<T>> {
    if parents.is_empty() {
        return Ok(Vec::new());
    }

    let wheel = Roulette::new(fit).context("failed to build roulette wheel")?;
    let strat_dist = Uniform::new(0, strategies.len())?;

    let children = (0..parents.len())
        .map(|_| {
            if mut_dist.sample(rng) {
                strategies[strat_dist.sample(rng)]
            } else {
                parents[wheel.sample(rng)]
            }
        })
        .collect();

    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::reference_config;
    use crate::payoff::sender_payoff;

    fn small_config(size: usize, prob_mut: f64) -> Config {
        let mut cfg = reference_config();
        cfg.model.size = size;
        cfg.model.prob_mut = prob_mut;
        cfg
    }

    #[test]
    fn initial_split_follows_fractions() {
        let cfg = reference_config();
        let engine = Engine::generate_initial_condition(cfg).unwrap();
        let state = engine.state();
        assert_eq!(state.low_senders.len(), 80);
        assert_eq!(state.high_senders.len(), 20);
        assert_eq!(state.low_receivers.len(), 80);
        assert_eq!(state.high_receivers.len(), 20);
    }

    #[test]
    fn uneven_split_rounds_up_low_type() {
        let mut cfg = small_config(10, 0.0);
        cfg.init.frac_low_senders = 0.25;
        cfg.init.frac_high_senders = 0.75;
        cfg.init.frac_low_receivers = 1.0;
        cfg.init.frac_high_receivers = 0.0;
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let state = initialize(&cfg, &mut rng).unwrap();
        assert_eq!(state.low_senders.len(), 3);
        assert_eq!(state.high_senders.len(), 7);
        assert_eq!(state.low_receivers.len(), 10);
        assert!(state.high_receivers.is_empty());

        let next = step(&cfg.model, &state, &mut rng).unwrap();
        assert!(next.high_receivers.is_empty());
        assert_eq!(next.low_receivers.len(), 10);
    }

    #[test]
    fn zero_generations_is_a_no_op() {
        let cfg = small_config(4, 0.0);
        let mut engine = Engine::generate_initial_condition(cfg).unwrap();
        let init = engine.state().clone();
        let records = engine.history(0).unwrap();
        assert!(records.is_empty());
        assert_eq!(engine.state(), &init);
        assert_eq!(engine.i_gen(), 0);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let cfg = small_config(30, 0.05);
        let mut engine_a = Engine::generate_initial_condition(cfg.clone()).unwrap();
        let mut engine_b = Engine::generate_initial_condition(cfg).unwrap();
        let hist_a = engine_a.history(20).unwrap();
        let hist_b = engine_b.history(20).unwrap();
        assert_eq!(hist_a, hist_b);
        assert_eq!(engine_a.state(), engine_b.state());
    }

    #[test]
    fn history_follows_save_stride() {
        let mut cfg = small_config(20, 0.02);
        cfg.output.gens_per_save = 3;
        let mut engine = Engine::generate_initial_condition(cfg).unwrap();
        let records = engine.history(10).unwrap();
        let i_gens: Vec<_> = records.iter().map(|rec| rec.i_gen).collect();
        assert_eq!(i_gens, vec![3, 6, 9]);
        assert_eq!(engine.i_gen(), 10);

        let records = engine.history(5).unwrap();
        let i_gens: Vec<_> = records.iter().map(|rec| rec.i_gen).collect();
        assert_eq!(i_gens, vec![12, 15]);

        let records = engine.history(1).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn step_keeps_sizes() {
        let cfg = reference_config();
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let mut state = initialize(&cfg, &mut rng).unwrap();
        for _ in 0..10 {
            let next = step(&cfg.model, &state, &mut rng).unwrap();
            assert_eq!(next.low_senders.len(), state.low_senders.len());
            assert_eq!(next.high_senders.len(), state.high_senders.len());
            assert_eq!(next.low_receivers.len(), state.low_receivers.len());
            assert_eq!(next.high_receivers.len(), state.high_receivers.len());
            state = next;
        }
    }

    #[test]
    fn without_mutation_strategies_come_from_parents() {
        let cfg = small_config(40, 0.0);
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let state = initialize(&cfg, &mut rng).unwrap();
        let next = step(&cfg.model, &state, &mut rng).unwrap();
        assert!(next.low_senders.iter().all(|sig| state.low_senders.contains(sig)));
        assert!(next.high_senders.iter().all(|sig| state.high_senders.contains(sig)));
        assert!(next.low_receivers.iter().all(|rec| state.low_receivers.contains(rec)));
        assert!(next.high_receivers.iter().all(|rec| state.high_receivers.contains(rec)));
    }

    #[test]
    fn full_mutation_ignores_parents() {
        let cfg = small_config(200, 1.0);
        let mut rng = ChaCha12Rng::seed_from_u64(13);
        let mut state = initialize(&cfg, &mut rng).unwrap();
        state.low_senders.fill(Signal::Normal);
        let next = step(&cfg.model, &state, &mut rng).unwrap();
        assert!(next.low_senders.iter().any(|&sig| sig != Signal::Normal));
    }

    #[test]
    fn rejecting_receivers_never_accept() {
        let cfg = small_config(50, 0.0);
        let mut rng = ChaCha12Rng::seed_from_u64(21);
        let mut state = initialize(&cfg, &mut rng).unwrap();
        let reject_all = Receiver::from_bits(0);
        state.low_receivers.fill(reject_all);
        state.high_receivers.fill(reject_all);

        for _ in 0..100 {
            state = step(&cfg.model, &state, &mut rng).unwrap();
        }

        assert!(state.low_receivers.iter().all(|&rec| rec == reject_all));
        assert!(state.high_receivers.iter().all(|&rec| rec == reject_all));
        let par = &cfg.model;
        for signal in Signal::ALL {
            for sender in [&par.low_sender, &par.high_sender] {
                let payoff = sender_payoff(
                    signal,
                    sender,
                    &state.low_receivers,
                    &state.high_receivers,
                    par.size,
                );
                assert_eq!(payoff, -sender.costs[signal.index()]);
            }
        }
    }

    #[test]
    fn underflowing_fitness_is_never_reproduced() {
        let mut cfg = small_config(100, 0.0);
        cfg.model.sel_strength = 9.0;
        let mut rng = ChaCha12Rng::seed_from_u64(17);
        let mut state = initialize(&cfg, &mut rng).unwrap();
        state.low_senders.fill(Signal::None);
        state.high_senders.fill(Signal::Normal);

        // The investing receiver pays for accepting every low sender and
        // rejects every high one, so its fitness underflows to zero.
        let costly = Receiver::from_bits(0b1001);
        let idle = Receiver::from_bits(0);
        state.low_receivers.fill(idle);
        state.low_receivers[0] = costly;

        let table = FitnessTable::new(&cfg.model, &state);
        assert_eq!(table.low_receivers[0], 0.0);

        let next = step(&cfg.model, &state, &mut rng).unwrap();
        assert!(next.low_receivers.iter().all(|&rec| rec == idle));
    }

    #[test]
    fn checkpoint_resumes_identically() {
        let test_dir = std::env::temp_dir().join("signare_checkpoint_test");
        std::fs::create_dir_all(&test_dir).unwrap();
        let file = test_dir.join("checkpoint.msgpack");

        let mut engine = Engine::generate_initial_condition(small_config(20, 0.1)).unwrap();
        engine.history(5).unwrap();
        engine.save_checkpoint(&file).unwrap();

        let mut resumed = Engine::load_checkpoint(&file).unwrap();
        assert_eq!(resumed.cfg(), engine.cfg());
        assert_eq!(resumed.i_gen(), 5);
        assert_eq!(engine.history(5).unwrap(), resumed.history(5).unwrap());

        std::fs::remove_dir_all(&test_dir).ok();
    }

    #[test]
    fn invalid_config_does_not_start() {
        let mut cfg = reference_config();
        cfg.init.frac_low_senders = 0.5;
        assert!(Engine::generate_initial_condition(cfg).is_err());
    }
}
