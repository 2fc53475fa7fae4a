//! Population state and derived proportions.

use crate::strategy::{Receiver, Signal};
use serde::{Deserialize, Serialize};

/// Population of one generation.
///
/// Subpopulation sizes are fixed at initialization and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub low_senders: Vec<Signal>,
    pub high_senders: Vec<Signal>,
    pub low_receivers: Vec<Receiver>,
    pub high_receivers: Vec<Receiver>,
}

impl State {
    pub fn proportions(&self) -> Proportions {
        Proportions {
            low_senders: SenderProps::of(&self.low_senders),
            high_senders: SenderProps::of(&self.high_senders),
            low_receivers: ReceiverProps::of(&self.low_receivers),
            high_receivers: ReceiverProps::of(&self.high_receivers),
        }
    }
}

/// Fraction of senders playing each signal. Sums to 1 for a non-empty subpopulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SenderProps {
    pub none: f64,
    pub normal: f64,
    pub hidden: f64,
}

impl SenderProps {
    pub fn of(senders: &[Signal]) -> Self {
        let frac = |signal| fraction(senders, |&sender| sender == signal);
        Self {
            none: frac(Signal::None),
            normal: frac(Signal::Normal),
            hidden: frac(Signal::Hidden),
        }
    }

    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::None => self.none,
            Signal::Normal => self.normal,
            Signal::Hidden => self.hidden,
        }
    }
}

/// Fraction of receivers with each flag set.
///
/// The flags are independent, so these values need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiverProps {
    pub accept_none: f64,
    pub accept_normal: f64,
    pub accept_hidden: f64,
    pub invest: f64,
}

impl ReceiverProps {
    pub fn of(receivers: &[Receiver]) -> Self {
        Self {
            accept_none: fraction(receivers, |rec| rec.accept_none),
            accept_normal: fraction(receivers, |rec| rec.accept_normal),
            accept_hidden: fraction(receivers, |rec| rec.accept_hidden),
            invest: fraction(receivers, |rec| rec.invest),
        }
    }
}

/// Strategy proportions of every subpopulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proportions {
    pub low_senders: SenderProps,
    pub high_senders: SenderProps,
    pub low_receivers: ReceiverProps,
    pub high_receivers: ReceiverProps,
}

impl Proportions {
    pub const N_ENTRIES: usize = 14;

    /// Flat list of labelled proportions.
    pub fn entries(&self) -> [(&'static str, f64); Self::N_ENTRIES] {
        let (ls, hs) = (&self.low_senders, &self.high_senders);
        let (lr, hr) = (&self.low_receivers, &self.high_receivers);
        [
            ("low_senders.none", ls.none),
            ("low_senders.normal", ls.normal),
            ("low_senders.hidden", ls.hidden),
            ("high_senders.none", hs.none),
            ("high_senders.normal", hs.normal),
            ("high_senders.hidden", hs.hidden),
            ("low_receivers.accept_none", lr.accept_none),
            ("low_receivers.accept_normal", lr.accept_normal),
            ("low_receivers.accept_hidden", lr.accept_hidden),
            ("low_receivers.invest", lr.invest),
            ("high_receivers.accept_none", hr.accept_none),
            ("high_receivers.accept_normal", hr.accept_normal),
            ("high_receivers.accept_hidden", hr.accept_hidden),
            ("high_receivers.invest", hr.invest),
        ]
    }
}

/// History record of the simulation at a single generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Number of generations elapsed since initialization.
    pub i_gen: usize,

    pub props: Proportions,
}

fn fraction<T>(subpop: &[T], pred: impl Fn(&T) -> bool) -> f64 {
    // An empty subpopulation has no individual with any strategy.
    if subpop.is_empty() {
        return 0.0;
    }
    subpop.iter().filter(|&ind| pred(ind)).count() as f64 / subpop.len() as f64
}
