//! Trend removal along the time axis.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Which trend to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetrendType {
    /// Least-squares straight line
    #[default]
    Linear,
    /// Mean only
    Constant,
}

/// Remove the trend from a single signal.
pub fn detrend_signal(signal: &[f64], kind: DetrendType) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mean = signal.iter().sum::<f64>() / n as f64;

    match kind {
        DetrendType::Constant => signal.iter().map(|&x| x - mean).collect(),
        DetrendType::Linear => {
            // Fit x(t) = mean + slope * (t - t_mean) with t = 0..n-1
            let t_mean = (n - 1) as f64 / 2.0;
            let mut sxy = 0.0;
            let mut sxx = 0.0;
            for (t, &x) in signal.iter().enumerate() {
                let dt = t as f64 - t_mean;
                sxy += dt * (x - mean);
                sxx += dt * dt;
            }
            let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

            signal
                .iter()
                .enumerate()
                .map(|(t, &x)| x - mean - slope * (t as f64 - t_mean))
                .collect()
        }
    }
}

/// Remove the trend from every column of `data` (rows are samples).
pub fn detrend(data: &Array2<f64>, kind: DetrendType) -> Array2<f64> {
    let mut out = data.clone();
    for mut col in out.columns_mut() {
        let detrended = detrend_signal(&col.to_vec(), kind);
        for (dst, src) in col.iter_mut().zip(detrended) {
            *dst = src;
        }
    }
    out
}
