//! Expected payoffs of individual strategies against the opposing populations.

use crate::config::{ReceiverConfig, SenderConfig};
use crate::strategy::{Receiver, Signal};

/// Payoff of a sender playing `signal` against every receiver.
///
/// Acceptance rewards are normalized by the total population `size`,
/// not by the number of receivers examined.
pub fn sender_payoff(
    signal: Signal,
    par: &SenderConfig,
    low_receivers: &[Receiver],
    high_receivers: &[Receiver],
    size: usize,
) -> f64 {
    let count = |receivers: &[Receiver]| {
        receivers
            .iter()
            .filter(|rec| rec.accepts_sender(signal))
            .count() as f64
    };
    let n_acc_low = count(low_receivers);
    let n_acc_high = count(high_receivers);

    (n_acc_low * par.rates[0] + n_acc_high * par.rates[1]) / size as f64 - par.costs[signal.index()]
}

/// Payoff of a receiver playing `receiver` against every sender.
///
/// Hidden signals are revealed according to the receiver's own investment
/// decision for both sender populations.
pub fn receiver_payoff(
    receiver: Receiver,
    par: &ReceiverConfig,
    low_senders: &[Signal],
    high_senders: &[Signal],
) -> f64 {
    let count = |senders: &[Signal]| {
        senders
            .iter()
            .filter(|&&signal| receiver.accepts_sender(signal))
            .count() as f64
    };
    let n_acc_low = count(low_senders);
    let n_acc_high = count(high_senders);

    let cost = if receiver.invest { par.cost_inv } else { 0.0 };

    n_acc_low * par.rates[0] + n_acc_high * par.rates[1] - cost
}
