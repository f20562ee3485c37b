//! Pulse-rate estimation from a stream of per-frame color samples.
//!
//! Each window is detrended with ICA, band-pass filtered to the plausible
//! heart-rate band, and the strongest in-band frequency of its power spectrum
//! is reported in beats per minute.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::detrend::DetrendType;
use crate::error::{DspError, Result};
use crate::filters::{create_filter, FilterConfig, FilterType};
use crate::ica::IcaParameters;
use crate::shim::{detrend_window, WINDOW_LEN};
use crate::spectrum::{dominant_frequency, fftfreq, power_spectrum};

/// Configuration for the pulse-rate pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Frame rate of the sample stream (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Lower edge of the heart-rate band (Hz)
    #[serde(default = "default_lowcut")]
    pub lowcut: f64,

    /// Upper edge of the heart-rate band (Hz)
    #[serde(default = "default_highcut")]
    pub highcut: f64,

    /// Butterworth order
    #[serde(default = "default_order")]
    pub order: usize,

    /// Samples per analysis window
    #[serde(default = "default_window_len")]
    pub window_len: usize,

    /// Samples between consecutive estimates
    #[serde(default = "default_step")]
    pub step: usize,

    /// Trend removed from the ICA source before filtering
    #[serde(default)]
    pub detrend: DetrendType,

    #[serde(default = "IcaParameters::single_component")]
    pub ica: IcaParameters,
}

fn default_sample_rate() -> f64 {
    30.0
}
fn default_lowcut() -> f64 {
    0.75
}
fn default_highcut() -> f64 {
    4.0
}
fn default_order() -> usize {
    4
}
fn default_window_len() -> usize {
    WINDOW_LEN
}
fn default_step() -> usize {
    5
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            lowcut: default_lowcut(),
            highcut: default_highcut(),
            order: default_order(),
            window_len: default_window_len(),
            step: default_step(),
            detrend: DetrendType::default(),
            ica: IcaParameters::single_component(),
        }
    }
}

impl PulseConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate > 0.0 && self.sample_rate.is_finite()) {
            return Err(DspError::InvalidParameter(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.window_len < 2 {
            return Err(DspError::InvalidParameter(format!(
                "window_len must be at least 2, got {}",
                self.window_len
            )));
        }
        if self.step == 0 {
            return Err(DspError::InvalidParameter("step must be at least 1".into()));
        }
        if self.ica.n_components != Some(1) {
            return Err(DspError::InvalidParameter(
                "pulse windows are single-channel; ica.n_components must be 1".into(),
            ));
        }
        // Surfaces band and order errors before any data arrives
        create_filter(&self.filter_config()).map(|_| ())
    }

    fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            filter_type: FilterType::Bandpass,
            frequency: self.lowcut,
            frequency_high: Some(self.highcut),
            order: self.order,
            sample_rate: self.sample_rate,
        }
    }
}

/// One pulse-rate estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseEstimate {
    /// Beats per minute
    pub bpm: f64,
    /// Frequency of the spectral peak (Hz)
    pub peak_frequency: f64,
    pub peak_power: f64,
    /// Peak power divided by mean in-band power
    pub snr: f64,
    pub n_samples: usize,
}

/// Estimate the pulse rate of one window of `config.window_len` samples.
pub fn estimate_pulse(window: &[f64], config: &PulseConfig) -> Result<PulseEstimate> {
    let detrended = detrend_window(window, config.window_len, &config.ica, config.detrend)?;

    let tf = create_filter(&config.filter_config())?;
    let filtered = tf.filter_columns(&detrended)?;

    let power = power_spectrum(&filtered)?;
    let freqs = fftfreq(config.window_len, 1.0 / config.sample_rate)?;

    let peak = dominant_frequency(
        &power.column(0).to_vec(),
        &freqs,
        config.lowcut,
        config.highcut,
    )
    .ok_or_else(|| {
        DspError::InvalidParameter(format!(
            "no frequency bin of a {}-sample window at {} Hz lies in {}-{} Hz",
            config.window_len, config.sample_rate, config.lowcut, config.highcut
        ))
    })?;

    let snr = if peak.band_mean_power > 0.0 {
        peak.power / peak.band_mean_power
    } else {
        0.0
    };

    let estimate = PulseEstimate {
        bpm: peak.frequency * 60.0,
        peak_frequency: peak.frequency,
        peak_power: peak.power,
        snr,
        n_samples: window.len(),
    };
    log::debug!(
        "[PULSE] {:.1} bpm (peak {:.3} Hz, snr {:.2})",
        estimate.bpm,
        estimate.peak_frequency,
        estimate.snr
    );
    Ok(estimate)
}

/// Sliding-window pulse tracker.
///
/// The first estimate is produced once `window_len` samples have arrived,
/// then one every `step` samples on the latest `window_len` samples.
#[derive(Debug, Clone)]
pub struct PulseTracker {
    config: PulseConfig,
    window: VecDeque<f64>,
    seen: usize,
    next_at: usize,
}

impl PulseTracker {
    pub fn new(config: PulseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: VecDeque::with_capacity(config.window_len),
            seen: 0,
            next_at: config.window_len,
            config,
        })
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    /// Number of samples pushed so far
    pub fn samples_seen(&self) -> usize {
        self.seen
    }

    /// Push one sample. Returns an estimate when a window is due.
    ///
    /// A failed estimate still advances the schedule, so a bad window (for
    /// example a frozen, constant signal) does not stall the tracker.
    pub fn push(&mut self, sample: f64) -> Result<Option<PulseEstimate>> {
        if self.window.len() == self.config.window_len {
            self.window.pop_front();
        }
        self.window.push_back(sample);
        self.seen += 1;

        if self.seen < self.next_at {
            return Ok(None);
        }
        self.next_at += self.config.step;

        let samples: Vec<f64> = self.window.iter().copied().collect();
        estimate_pulse(&samples, &self.config).map(Some)
    }

    /// Drop buffered samples and restart the schedule.
    pub fn reset(&mut self) {
        self.window.clear();
        self.seen = 0;
        self.next_at = self.config.window_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use std::io::Write;

    fn synthetic_pulse(n: usize, fs: f64, hz: f64) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let t = t as f64 / fs;
                // slow illumination drift plus a weak pulse
                40.0 + 0.8 * t + 0.5 * (2.0 * PI * hz * t).sin() + 0.2 * (2.0 * PI * 0.1 * t).cos()
            })
            .collect()
    }

    #[test]
    fn test_estimate_recovers_pulse() {
        let config = PulseConfig::default();
        let window = synthetic_pulse(config.window_len, config.sample_rate, 1.2);
        let estimate = estimate_pulse(&window, &config).unwrap();
        assert!((estimate.bpm - 72.0).abs() < 1e-6, "bpm {}", estimate.bpm);
        assert!(estimate.snr > 1.0);
        assert_eq!(estimate.n_samples, 150);
    }

    #[test]
    fn test_estimate_with_constant_detrend() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"detrend": "constant"}}"#).unwrap();
        let config = PulseConfig::from_file(file.path()).unwrap();
        assert_eq!(config.detrend, DetrendType::Constant);

        let window = synthetic_pulse(config.window_len, config.sample_rate, 1.2);
        let estimate = estimate_pulse(&window, &config).unwrap();
        assert!(
            estimate.bpm >= 60.0 * config.lowcut && estimate.bpm <= 60.0 * config.highcut,
            "bpm {}",
            estimate.bpm
        );
    }

    #[test]
    fn test_tracker_schedule() {
        let config = PulseConfig::default();
        let mut tracker = PulseTracker::new(config.clone()).unwrap();
        let stream = synthetic_pulse(170, config.sample_rate, 1.4);

        let mut emitted_at = Vec::new();
        for (i, &x) in stream.iter().enumerate() {
            if let Some(est) = tracker.push(x).unwrap() {
                assert!((est.bpm - 84.0).abs() < 1e-6, "bpm {}", est.bpm);
                emitted_at.push(i + 1);
            }
        }
        assert_eq!(emitted_at, vec![150, 155, 160, 165, 170]);
        assert_eq!(tracker.samples_seen(), 170);

        tracker.reset();
        assert_eq!(tracker.samples_seen(), 0);
        assert!(tracker.push(1.0).unwrap().is_none());
    }

    #[test]
    fn test_tracker_survives_constant_window() {
        let config = PulseConfig {
            window_len: 20,
            step: 2,
            ..Default::default()
        };
        let mut tracker = PulseTracker::new(config).unwrap();
        for _ in 0..19 {
            assert!(tracker.push(5.0).unwrap().is_none());
        }
        assert!(matches!(tracker.push(5.0), Err(DspError::ZeroVariance(_))));
        assert!(tracker.push(5.0).unwrap().is_none());
    }

    #[test]
    fn test_config_validation() {
        let bad_band = PulseConfig {
            highcut: 20.0,
            ..Default::default()
        };
        assert!(bad_band.validate().is_err());

        let bad_step = PulseConfig {
            step: 0,
            ..Default::default()
        };
        assert!(PulseTracker::new(bad_step).is_err());

        assert!(PulseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_from_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sample_rate": 25.0, "highcut": 3.0}}"#).unwrap();

        let config = PulseConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sample_rate, 25.0);
        assert_eq!(config.highcut, 3.0);
        assert_eq!(config.lowcut, 0.75);
        assert_eq!(config.window_len, 150);
        assert_eq!(config.ica.n_components, Some(1));
        assert_eq!(config.detrend, DetrendType::Linear);
    }

    #[test]
    fn test_config_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            PulseConfig::from_file(file.path()),
            Err(DspError::Config(_))
        ));
    }
}
