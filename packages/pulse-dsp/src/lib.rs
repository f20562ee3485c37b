//! Signal-processing primitives for camera-based pulse-rate estimation.
//!
//! The [`shim`] functions are the host-facing surface: ICA-based detrending,
//! Butterworth band-pass filtering, power spectrum and DFT sample
//! frequencies. 2-D sequences are row-major with one row per sample.

pub mod detrend;
pub mod error;
pub mod filters;
pub mod ica;
pub mod pulse;
pub mod shim;
pub mod signal;
pub mod spectrum;

pub use error::{DspError, Result};
pub use pulse::{estimate_pulse, PulseConfig, PulseEstimate, PulseTracker};
pub use shim::{butter_bandpass_filter, fftfreq, get_detrend, get_powerSpec, WINDOW_LEN};
