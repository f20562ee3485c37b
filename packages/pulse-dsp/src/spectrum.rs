//! Power spectrum and DFT sample frequencies.

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::error::{DspError, Result};

// Thread-local FFT planner for reuse across calls
thread_local! {
    static FFT_PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

/// Squared magnitude of the DFT of every column of `data`, taken along the
/// time axis (axis 0). The output has the same shape as the input.
pub fn power_spectrum(data: &Array2<f64>) -> Result<Array2<f64>> {
    let (n_samples, n_channels) = data.dim();
    if n_samples == 0 || n_channels == 0 {
        return Err(DspError::EmptyInput(format!(
            "Invalid number of FFT data points ({})",
            n_samples
        )));
    }

    let fft = FFT_PLANNER.with(|planner| planner.borrow_mut().plan_fft_forward(n_samples));

    let mut power = Array2::<f64>::zeros((n_samples, n_channels));
    let mut buffer = vec![Complex::new(0.0, 0.0); n_samples];

    for (col, mut out) in data.columns().into_iter().zip(power.columns_mut()) {
        for (dst, &x) in buffer.iter_mut().zip(col.iter()) {
            *dst = Complex::new(x, 0.0);
        }
        fft.process(&mut buffer);
        for (dst, c) in out.iter_mut().zip(buffer.iter()) {
            *dst = c.norm_sqr();
        }
    }

    Ok(power)
}

/// DFT sample frequencies for a length-`n` transform with sample spacing
/// `spacing`, in the standard order: zero, positive frequencies, then
/// negative frequencies.
pub fn fftfreq(n: usize, spacing: f64) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(DspError::InvalidParameter(
            "Number of frequency bins must be positive".into(),
        ));
    }
    if spacing == 0.0 || !spacing.is_finite() {
        return Err(DspError::InvalidParameter(format!(
            "Sample spacing must be finite and non-zero, got {}",
            spacing
        )));
    }

    let scale = 1.0 / (n as f64 * spacing);
    let positive = (n - 1) / 2 + 1;
    let negative_start = -((n / 2) as i64);

    let freqs = (0..positive as i64)
        .chain(negative_start..0)
        .map(|k| k as f64 * scale)
        .collect();
    Ok(freqs)
}

/// Spectral peak inside a frequency band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    pub frequency: f64,
    pub power: f64,
    /// Mean power over all bins in the band
    pub band_mean_power: f64,
}

/// Strongest bin whose frequency lies in `[low, high]`. Bins with a NaN
/// power are ignored.
pub fn dominant_frequency(
    power: &[f64],
    frequencies: &[f64],
    low: f64,
    high: f64,
) -> Option<SpectralPeak> {
    let in_band: Vec<(f64, f64)> = frequencies
        .iter()
        .zip(power)
        .map(|(&f, &p)| (f, p))
        .filter(|&(f, p)| f >= low && f <= high && !p.is_nan())
        .collect();

    let band_mean_power = in_band.iter().map(|(_, p)| p).sum::<f64>() / in_band.len() as f64;

    in_band
        .iter()
        .copied()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(frequency, power)| SpectralPeak {
            frequency,
            power,
            band_mean_power,
        })
}
