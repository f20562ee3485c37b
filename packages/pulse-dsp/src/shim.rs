//! Host-facing operations.
//!
//! Names, argument order and argument types mirror the host binding, which
//! calls these four functions by name. The boolean arguments carried by
//! `get_detrend` and `get_powerSpec` are placeholders required by the binding
//! and are ignored.

use ndarray::Array2;

use crate::detrend::{detrend, DetrendType};
use crate::error::{DspError, Result};
use crate::filters::ButterworthFilter;
use crate::ica::{IcaParameters, IcaProcessor};
use crate::signal::{from_array2, to_array2, zscore_columns};
use crate::spectrum;

/// Number of samples in one detrend window.
pub const WINDOW_LEN: usize = 150;

/// Normalize `window`, reshape it into a `window_len x 1` column, extract one
/// independent component and remove its trend.
pub fn detrend_window(
    window: &[f64],
    window_len: usize,
    params: &IcaParameters,
    kind: DetrendType,
) -> Result<Array2<f64>> {
    if window.len() != window_len {
        return Err(DspError::ShapeMismatch(format!(
            "cannot reshape window of {} samples into ({}, 1)",
            window.len(),
            window_len
        )));
    }

    let column = Array2::from_shape_vec((window_len, 1), window.to_vec())
        .map_err(|e| DspError::ShapeMismatch(e.to_string()))?;
    let normalized = zscore_columns(&column)?;

    let sources = IcaProcessor::fit_transform(&normalized, params)?;
    Ok(detrend(&sources, kind))
}

/// ICA-based detrend of a fixed-length window. Returns a `150 x 1` matrix.
pub fn get_detrend(window: &[f64], _unused: bool) -> Result<Vec<Vec<f64>>> {
    log::debug!("get_detrend: {} samples", window.len());
    let detrended = detrend_window(
        window,
        WINDOW_LEN,
        &IcaParameters::single_component(),
        DetrendType::Linear,
    )?;
    Ok(from_array2(&detrended))
}

/// Butterworth band-pass of order `order` between `lowcut` and `highcut` Hz,
/// applied along the time axis of every column of `data`.
pub fn butter_bandpass_filter(
    data: &[Vec<f64>],
    lowcut: f64,
    highcut: f64,
    fs: f64,
    order: i32,
) -> Result<Vec<Vec<f64>>> {
    log::debug!(
        "butter_bandpass_filter: {} rows, band {}-{} Hz, fs={}, order={}",
        data.len(),
        lowcut,
        highcut,
        fs,
        order
    );

    if order < 1 {
        return Err(DspError::InvalidParameter(format!(
            "Filter order must be at least 1, got {}",
            order
        )));
    }
    if !(fs > 0.0 && fs.is_finite()) {
        return Err(DspError::InvalidParameter(format!(
            "Sample rate must be positive, got {}",
            fs
        )));
    }

    let nyq = 0.5 * fs;
    let tf = ButterworthFilter::bandpass(order as usize, lowcut / nyq, highcut / nyq)?;

    let matrix = to_array2(data)?;
    let filtered = tf.filter_columns(&matrix)?;
    Ok(from_array2(&filtered))
}

/// Squared magnitude of the DFT of `y` along its first axis.
#[allow(non_snake_case)]
pub fn get_powerSpec(y: &[Vec<f64>], _unused: bool) -> Result<Vec<Vec<f64>>> {
    log::debug!("get_powerSpec: {} rows", y.len());
    let matrix = to_array2(y)?;
    let power = spectrum::power_spectrum(&matrix)?;
    Ok(from_array2(&power))
}

/// DFT sample frequencies for `n` bins at sample spacing `spacing`.
pub fn fftfreq(n: i32, spacing: f64) -> Result<Vec<f64>> {
    log::debug!("fftfreq: n={}, spacing={}", n, spacing);
    if n <= 0 {
        return Err(DspError::InvalidParameter(format!(
            "Number of frequency bins must be positive, got {}",
            n
        )));
    }
    spectrum::fftfreq(n as usize, spacing)
}
