//! EMA (Exponential Moving Average) indicator

/// Recursive EMA over the whole series, seeded with the first value.
///
/// alpha = 2 / (span + 1); `ema[t] = (1 - alpha) * ema[t-1] + alpha * x[t]`.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            Some(p) => (1.0 - alpha) * p + alpha * v,
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}
