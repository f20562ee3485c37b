use js_sys::{Array, Float64Array};
use pulse_dsp::{shim, PulseConfig, PulseTracker as Tracker};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(err: pulse_dsp::DspError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// 2-D marshalling: JS `number[][]` (or an array of Float64Array rows)
// ============================================================================

fn is_row(value: &JsValue) -> bool {
    Array::is_array(value) || value.is_instance_of::<Float64Array>()
}

/// Rows must be arrays; a flat `number[]` would otherwise turn each number
/// into a zero-filled buffer of that length.
fn rows_from_js(data: &Array) -> Result<Vec<Vec<f64>>, JsValue> {
    data.iter()
        .enumerate()
        .map(|(i, row)| {
            if is_row(&row) {
                Ok(Float64Array::new(&row).to_vec())
            } else {
                Err(JsValue::from_str(&format!(
                    "Shape mismatch: row {} is not an array; expected number[][]",
                    i
                )))
            }
        })
        .collect()
}

fn rows_to_js(rows: &[Vec<f64>]) -> Array {
    rows.iter()
        .map(|row| JsValue::from(Float64Array::from(row.as_slice())))
        .collect()
}

// ============================================================================
// HOST OPERATIONS
// ============================================================================

/// ICA-based detrend of a 150-sample window.
/// Returns 150 rows of one value each.
#[wasm_bindgen]
pub fn get_detrend(window: &[f64], unused: bool) -> Result<Array, JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    let rows = shim::get_detrend(window, unused).map_err(to_js)?;
    Ok(rows_to_js(&rows))
}

/// Butterworth band-pass along the time axis (rows) of `data`.
/// lowcut, highcut: band edges in Hz
/// fs: sample rate in Hz
#[wasm_bindgen]
pub fn butter_bandpass_filter(
    data: &Array,
    lowcut: f64,
    highcut: f64,
    fs: f64,
    order: i32,
) -> Result<Array, JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    let rows = rows_from_js(data)?;
    let filtered =
        shim::butter_bandpass_filter(&rows, lowcut, highcut, fs, order).map_err(to_js)?;
    Ok(rows_to_js(&filtered))
}

/// Squared DFT magnitude along the time axis (rows) of `y`.
#[wasm_bindgen]
#[allow(non_snake_case)]
pub fn get_powerSpec(y: &Array, unused: bool) -> Result<Array, JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    let rows = rows_from_js(y)?;
    let power = shim::get_powerSpec(&rows, unused).map_err(to_js)?;
    Ok(rows_to_js(&power))
}

/// DFT sample frequencies for `n` bins at sample spacing `spacing`.
#[wasm_bindgen]
pub fn fftfreq(n: i32, spacing: f64) -> Result<Vec<f64>, JsValue> {
    shim::fftfreq(n, spacing).map_err(to_js)
}

// ============================================================================
// PULSE RATE
// ============================================================================

/// One pulse-rate estimate
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct PulseReading {
    pub bpm: f64,
    pub peak_frequency: f64,
    pub snr: f64,
}

impl From<pulse_dsp::PulseEstimate> for PulseReading {
    fn from(e: pulse_dsp::PulseEstimate) -> Self {
        Self {
            bpm: e.bpm,
            peak_frequency: e.peak_frequency,
            snr: e.snr,
        }
    }
}

fn pulse_config(sample_rate: f64, lowcut: f64, highcut: f64) -> PulseConfig {
    PulseConfig {
        sample_rate,
        lowcut,
        highcut,
        ..Default::default()
    }
}

/// Estimate the pulse rate of one 150-sample window
/// sample_rate: frame rate of the samples in Hz
#[wasm_bindgen]
pub fn estimate_pulse(
    window: &[f64],
    sample_rate: f64,
    lowcut: f64,
    highcut: f64,
) -> Result<PulseReading, JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    let config = pulse_config(sample_rate, lowcut, highcut);
    config.validate().map_err(to_js)?;
    pulse_dsp::estimate_pulse(window, &config)
        .map(PulseReading::from)
        .map_err(to_js)
}

/// Sliding-window pulse tracker fed one sample per frame
#[wasm_bindgen]
pub struct PulseTracker {
    inner: Tracker,
}

#[wasm_bindgen]
impl PulseTracker {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64, lowcut: f64, highcut: f64) -> Result<PulseTracker, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        set_panic_hook();

        let inner = Tracker::new(pulse_config(sample_rate, lowcut, highcut)).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Push one sample; returns a reading when a window is due
    pub fn push(&mut self, sample: f64) -> Result<Option<PulseReading>, JsValue> {
        self.inner
            .push(sample)
            .map(|e| e.map(PulseReading::from))
            .map_err(to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn samples_seen(&self) -> usize {
        self.inner.samples_seen()
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}
