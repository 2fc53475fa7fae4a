//! Wright-Fisher simulation of a costly signaling game with hidden signals.
//!
//! Low and high type senders choose between sending no signal, a normal
//! signal or a hidden signal that only investing receivers can see. Low and
//! high type receivers choose which perceived signals to accept and whether
//! to invest. Every generation each individual earns a payoff against the
//! opposing populations, and the next generation is resampled in proportion
//! to the exponential fitness of those payoffs, with uniform mutation.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod fitness;
pub mod manager;
pub mod model;
pub mod payoff;
pub mod stats;
pub mod strategy;

pub use config::Config;
pub use engine::{Engine, initialize, step};
pub use model::{Proportions, Record, State};
pub use strategy::{Receiver, Signal};
