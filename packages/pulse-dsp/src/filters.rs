//! Digital Filter Implementations
//!
//! Butterworth IIR design in zero/pole/gain form (analog prototype, band
//! transform, bilinear transform) expanded to transfer-function coefficients,
//! and direct-form linear filtering with zero initial state.

use ndarray::Array2;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{DspError, Result};

type C64 = Complex<f64>;

/// Sample rate used internally by the design routines; critical frequencies
/// are normalized so that 1.0 is the Nyquist frequency.
const DESIGN_FS: f64 = 2.0;

/// Highest supported design order. Beyond this the expanded (b, a)
/// polynomials lose all precision.
pub const MAX_ORDER: usize = 32;

/// Filter type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
}

/// Configuration for a filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub filter_type: FilterType,
    /// Cutoff frequency in Hz (low edge for bandpass)
    pub frequency: f64,
    /// High cutoff for bandpass
    pub frequency_high: Option<f64>,
    /// Filter order. A bandpass of order N has 2N poles.
    pub order: usize,
    /// Sampling rate in Hz
    pub sample_rate: f64,
}

/// Zero/pole/gain representation of a filter
#[derive(Debug, Clone)]
pub struct ZeroPoleGain {
    pub zeros: Vec<C64>,
    pub poles: Vec<C64>,
    pub gain: f64,
}

impl ZeroPoleGain {
    fn degree(&self) -> usize {
        self.poles.len().saturating_sub(self.zeros.len())
    }

    /// Expand zeros and poles into polynomial coefficients.
    pub fn to_transfer_function(&self) -> TransferFunction {
        let b = poly(&self.zeros)
            .into_iter()
            .map(|c| self.gain * c.re)
            .collect();
        let a = poly(&self.poles).into_iter().map(|c| c.re).collect();
        TransferFunction { b, a }
    }
}

/// Transfer function coefficients.
/// H(z) = (b[0] + b[1]*z^-1 + ...) / (a[0] + a[1]*z^-1 + ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl TransferFunction {
    /// Filter one signal from a zero initial state.
    pub fn filter(&self, signal: &[f64]) -> Result<Vec<f64>> {
        lfilter(&self.b, &self.a, signal)
    }

    /// Filter every column of `data` (rows are samples) independently.
    pub fn filter_columns(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let mut out = data.clone();
        for mut col in out.columns_mut() {
            let filtered = self.filter(&col.to_vec())?;
            for (dst, src) in col.iter_mut().zip(filtered) {
                *dst = src;
            }
        }
        Ok(out)
    }

    /// Magnitude response |H| at the given frequencies (Hz).
    pub fn frequency_response(&self, frequencies: &[f64], sample_rate: f64) -> Vec<f64> {
        let eval = |coeffs: &[f64], w: f64| -> C64 {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| C64::from_polar(c, -w * k as f64))
                .sum()
        };

        frequencies
            .iter()
            .map(|&f| {
                let w = 2.0 * PI * f / sample_rate;
                (eval(&self.b, w) / eval(&self.a, w)).norm()
            })
            .collect()
    }
}

/// Direct-form linear filter with persistent state (Direct Form II Transposed)
#[derive(Debug, Clone)]
pub struct LinearFilter {
    b: Vec<f64>,
    a: Vec<f64>,
    state: Vec<f64>,
}

impl LinearFilter {
    pub fn new(tf: &TransferFunction) -> Result<Self> {
        let a0 = match tf.a.first() {
            Some(&a0) if a0 != 0.0 && a0.is_finite() => a0,
            _ => {
                return Err(DspError::InvalidParameter(
                    "first denominator coefficient must be finite and non-zero".into(),
                ))
            }
        };
        if tf.b.is_empty() {
            return Err(DspError::InvalidParameter(
                "numerator must have at least one coefficient".into(),
            ));
        }

        let len = tf.a.len().max(tf.b.len());
        let mut b: Vec<f64> = tf.b.iter().map(|&x| x / a0).collect();
        let mut a: Vec<f64> = tf.a.iter().map(|&x| x / a0).collect();
        b.resize(len, 0.0);
        a.resize(len, 0.0);

        Ok(Self {
            b,
            a,
            state: vec![0.0; len - 1],
        })
    }

    /// Process a single sample
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let n = self.state.len();
        if n == 0 {
            return self.b[0] * input;
        }

        let output = self.b[0] * input + self.state[0];
        for i in 0..n - 1 {
            self.state[i] = self.b[i + 1] * input + self.state[i + 1] - self.a[i + 1] * output;
        }
        self.state[n - 1] = self.b[n] * input - self.a[n] * output;
        output
    }

    /// Process an entire signal array in-place
    pub fn process_signal(&mut self, signal: &mut [f64]) {
        for sample in signal.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|z| *z = 0.0);
    }
}

/// Apply the filter `b / a` to `signal` starting from rest.
pub fn lfilter(b: &[f64], a: &[f64], signal: &[f64]) -> Result<Vec<f64>> {
    let mut filter = LinearFilter::new(&TransferFunction {
        b: b.to_vec(),
        a: a.to_vec(),
    })?;
    let mut out = signal.to_vec();
    filter.process_signal(&mut out);
    Ok(out)
}

/// Butterworth filter designer.
///
/// Critical frequencies are normalized to the Nyquist frequency and must lie
/// strictly inside (0, 1).
pub struct ButterworthFilter;

impl ButterworthFilter {
    /// Design a Butterworth lowpass filter
    pub fn lowpass(order: usize, wn: f64) -> Result<TransferFunction> {
        Self::check_order(order)?;
        Self::check_critical(wn)?;
        let warped = Self::prewarp(wn);
        let analog = Self::lp2lp(Self::prototype(order), warped);
        Ok(Self::bilinear(analog).to_transfer_function())
    }

    /// Design a Butterworth highpass filter
    pub fn highpass(order: usize, wn: f64) -> Result<TransferFunction> {
        Self::check_order(order)?;
        Self::check_critical(wn)?;
        let warped = Self::prewarp(wn);
        let analog = Self::lp2hp(Self::prototype(order), warped);
        Ok(Self::bilinear(analog).to_transfer_function())
    }

    /// Design a Butterworth bandpass filter with `2 * order` poles
    pub fn bandpass(order: usize, low: f64, high: f64) -> Result<TransferFunction> {
        Self::check_order(order)?;
        Self::check_critical(low)?;
        Self::check_critical(high)?;
        if low >= high {
            return Err(DspError::InvalidParameter(format!(
                "Low critical frequency ({}) must be less than high critical frequency ({})",
                low, high
            )));
        }

        let w_low = Self::prewarp(low);
        let w_high = Self::prewarp(high);
        let bw = w_high - w_low;
        let wo = (w_low * w_high).sqrt();

        let analog = Self::lp2bp(Self::prototype(order), wo, bw);
        Ok(Self::bilinear(analog).to_transfer_function())
    }

    fn check_order(order: usize) -> Result<()> {
        if order == 0 || order > MAX_ORDER {
            return Err(DspError::InvalidParameter(format!(
                "Filter order must be between 1 and {}, got {}",
                MAX_ORDER, order
            )));
        }
        Ok(())
    }

    fn check_critical(wn: f64) -> Result<()> {
        if !(wn > 0.0 && wn < 1.0) {
            return Err(DspError::InvalidParameter(format!(
                "Digital filter critical frequencies must be 0 < Wn < 1, got {}",
                wn
            )));
        }
        Ok(())
    }

    /// Analog lowpass prototype with unit cutoff: N poles on the left half of
    /// the unit circle, no zeros.
    fn prototype(order: usize) -> ZeroPoleGain {
        let n = order as i64;
        let poles = (0..n)
            .map(|k| {
                let m = (-n + 1 + 2 * k) as f64;
                -C64::from_polar(1.0, PI * m / (2.0 * n as f64))
            })
            .collect();
        ZeroPoleGain {
            zeros: Vec::new(),
            poles,
            gain: 1.0,
        }
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(wn: f64) -> f64 {
        2.0 * DESIGN_FS * (PI * wn / DESIGN_FS).tan()
    }

    fn lp2lp(proto: ZeroPoleGain, wo: f64) -> ZeroPoleGain {
        let degree = proto.degree() as i32;
        ZeroPoleGain {
            zeros: proto.zeros.iter().map(|&z| z * wo).collect(),
            poles: proto.poles.iter().map(|&p| p * wo).collect(),
            gain: proto.gain * wo.powi(degree),
        }
    }

    fn lp2hp(proto: ZeroPoleGain, wo: f64) -> ZeroPoleGain {
        let degree = proto.degree();
        let num: C64 = proto.zeros.iter().map(|&z| -z).product();
        let den: C64 = proto.poles.iter().map(|&p| -p).product();

        let mut zeros: Vec<C64> = proto.zeros.iter().map(|&z| wo / z).collect();
        zeros.extend(std::iter::repeat(C64::new(0.0, 0.0)).take(degree));

        ZeroPoleGain {
            zeros,
            poles: proto.poles.iter().map(|&p| wo / p).collect(),
            gain: proto.gain * (num / den).re,
        }
    }

    fn lp2bp(proto: ZeroPoleGain, wo: f64, bw: f64) -> ZeroPoleGain {
        let degree = proto.degree();
        let wo2 = C64::new(wo * wo, 0.0);

        let split = |roots: &[C64]| -> Vec<C64> {
            let scaled: Vec<C64> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
            let upper = scaled.iter().map(|&r| r + (r * r - wo2).sqrt());
            let lower = scaled.iter().map(|&r| r - (r * r - wo2).sqrt());
            upper.chain(lower).collect()
        };

        let mut zeros = split(&proto.zeros);
        zeros.extend(std::iter::repeat(C64::new(0.0, 0.0)).take(degree));

        ZeroPoleGain {
            zeros,
            poles: split(&proto.poles),
            gain: proto.gain * bw.powi(degree as i32),
        }
    }

    /// Map an analog filter to the z-plane.
    fn bilinear(analog: ZeroPoleGain) -> ZeroPoleGain {
        let fs2 = C64::new(2.0 * DESIGN_FS, 0.0);
        let degree = analog.degree();

        let num: C64 = analog.zeros.iter().map(|&z| fs2 - z).product();
        let den: C64 = analog.poles.iter().map(|&p| fs2 - p).product();

        let mut zeros: Vec<C64> = analog.zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
        zeros.extend(std::iter::repeat(C64::new(-1.0, 0.0)).take(degree));

        ZeroPoleGain {
            zeros,
            poles: analog.poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect(),
            gain: analog.gain * (num / den).re,
        }
    }
}

/// Monic polynomial with the given roots, highest power first.
fn poly(roots: &[C64]) -> Vec<C64> {
    let mut coeffs = vec![C64::new(1.0, 0.0)];
    for &r in roots {
        let mut next = vec![C64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * r;
        }
        coeffs = next;
    }
    coeffs
}

/// Create a filter from configuration
pub fn create_filter(config: &FilterConfig) -> Result<TransferFunction> {
    if !(config.sample_rate > 0.0 && config.sample_rate.is_finite()) {
        return Err(DspError::InvalidParameter(format!(
            "Sample rate must be positive, got {}",
            config.sample_rate
        )));
    }
    let nyquist = config.sample_rate / 2.0;

    match config.filter_type {
        FilterType::Lowpass => {
            ButterworthFilter::lowpass(config.order, config.frequency / nyquist)
        }
        FilterType::Highpass => {
            ButterworthFilter::highpass(config.order, config.frequency / nyquist)
        }
        FilterType::Bandpass => {
            let high = config.frequency_high.ok_or_else(|| {
                DspError::InvalidParameter("Bandpass filter requires frequency_high".into())
            })?;
            if config.frequency >= high {
                return Err(DspError::InvalidParameter(format!(
                    "Low cutoff ({} Hz) must be less than high cutoff ({} Hz)",
                    config.frequency, high
                )));
            }
            if high >= nyquist {
                return Err(DspError::InvalidParameter(format!(
                    "High cutoff ({} Hz) must be less than Nyquist ({} Hz)",
                    high, nyquist
                )));
            }
            ButterworthFilter::bandpass(config.order, config.frequency / nyquist, high / nyquist)
        }
    }
}
