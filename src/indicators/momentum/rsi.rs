//! RSI (Relative Strength Index) indicator

use crate::indicators::trend::ema_series;

/// RSI at every point of `closes`, smoothing gains and losses with an EMA of `period`.
///
/// RSI = 100 - (100 / (1 + RS)), RS = smoothed gain / smoothed loss.
/// Index 0 has no change to measure and is `None`; so is any point where both
/// smoothed gain and loss are zero.
pub fn rsi_series(closes: &[f64], period: u32) -> Vec<Option<f64>> {
    if closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = ema_series(&gains, period as usize);
    let avg_loss = ema_series(&losses, period as usize);

    let mut out = Vec::with_capacity(closes.len());
    out.push(None);
    for (gain, loss) in avg_gain.iter().zip(avg_loss.iter()) {
        let value = if *loss == 0.0 {
            if *gain == 0.0 {
                None
            } else {
                Some(100.0)
            }
        } else {
            let rs = gain / loss;
            Some(100.0 - (100.0 / (1.0 + rs)))
        };
        out.push(value);
    }
    out
}
