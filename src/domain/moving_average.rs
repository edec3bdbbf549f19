//! Simple Moving Average.
//!
//! SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n
//! Warmup: first (n-1) entries are undefined. A series shorter than the
//! window is undefined everywhere.

use crate::domain::error::CrossoverError;

pub fn moving_average(series: &[f64], window: usize) -> Result<Vec<Option<f64>>, CrossoverError> {
    if window == 0 {
        return Err(CrossoverError::invalid_parameter(
            "window",
            "window must be > 0",
        ));
    }

    if series.len() < window {
        return Ok(vec![None; series.len()]);
    }

    let divisor = window as f64;
    let mut values = Vec::with_capacity(series.len());
    values.extend(std::iter::repeat_n(None, window - 1));

    // Each mean is summed from its own window so identical windows produce
    // bit-identical averages.
    for slice in series.windows(window) {
        values.push(Some(slice.iter().sum::<f64>() / divisor));
    }

    Ok(values)
}
