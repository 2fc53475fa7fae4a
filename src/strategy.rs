//! Strategy spaces of the signaling game.

use serde::{Deserialize, Serialize};

/// Signal sent by a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// No signal at all.
    None,
    /// A signal every receiver can see.
    Normal,
    /// A signal only receivers that invested can see.
    Hidden,
}

impl Signal {
    /// Every sender strategy, in index order.
    pub const ALL: [Signal; 3] = [Signal::None, Signal::Normal, Signal::Hidden];

    /// Position of the signal in [`Signal::ALL`] and in the sender cost tables.
    pub fn index(self) -> usize {
        match self {
            Signal::None => 0,
            Signal::Normal => 1,
            Signal::Hidden => 2,
        }
    }

    /// Signal as perceived by a receiver with the given investment decision.
    ///
    /// A hidden signal is only revealed to receivers that invest; to everyone
    /// else it is indistinguishable from sending no signal.
    pub fn perceived(self, invest: bool) -> Signal {
        match self {
            Signal::Hidden if !invest => Signal::None,
            signal => signal,
        }
    }
}

/// Strategy of a receiver: which perceived signals it accepts and whether it invests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Receiver {
    pub accept_none: bool,
    pub accept_normal: bool,
    pub accept_hidden: bool,
    pub invest: bool,
}

impl Receiver {
    /// Every receiver strategy, in index order.
    pub const ALL: [Receiver; 16] = {
        let mut all = [Receiver::from_bits(0); 16];
        let mut bits = 0;
        while bits < 16 {
            all[bits] = Receiver::from_bits(bits as u8);
            bits += 1;
        }
        all
    };

    /// Build a strategy from its 4-bit code (`accept_none` is the most significant bit).
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            accept_none: bits & 0b1000 != 0,
            accept_normal: bits & 0b0100 != 0,
            accept_hidden: bits & 0b0010 != 0,
            invest: bits & 0b0001 != 0,
        }
    }

    /// Whether the receiver accepts a sender whose signal it perceives as `signal`.
    pub fn accepts(&self, signal: Signal) -> bool {
        match signal {
            Signal::None => self.accept_none,
            Signal::Normal => self.accept_normal,
            Signal::Hidden => self.accept_hidden,
        }
    }

    /// Whether the receiver accepts a sender that actually plays `signal`.
    pub fn accepts_sender(&self, signal: Signal) -> bool {
        self.accepts(signal.perceived(self.invest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn receiver_space_is_complete() {
        let distinct: HashSet<_> = Receiver::ALL.iter().collect();
        assert_eq!(distinct.len(), 16);
        assert_eq!(Receiver::ALL[0], Receiver::from_bits(0));
        assert!(Receiver::ALL[1].invest && !Receiver::ALL[1].accept_none);
        assert!(Receiver::ALL[8].accept_none && !Receiver::ALL[8].invest);
    }

    #[test]
    fn signal_indices_follow_all() {
        for (idx, signal) in Signal::ALL.iter().enumerate() {
            assert_eq!(signal.index(), idx);
        }
    }

    #[test]
    fn hidden_signal_needs_investment() {
        assert_eq!(Signal::Hidden.perceived(false), Signal::None);
        assert_eq!(Signal::Hidden.perceived(true), Signal::Hidden);
        assert_eq!(Signal::Normal.perceived(false), Signal::Normal);

        let rec = Receiver {
            accept_none: false,
            accept_normal: false,
            accept_hidden: true,
            invest: false,
        };
        assert!(!rec.accepts_sender(Signal::Hidden));
        let rec = Receiver { invest: true, ..rec };
        assert!(rec.accepts_sender(Signal::Hidden));
    }
}
