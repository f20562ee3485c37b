use linfa::prelude::*;
use linfa_ica::fast_ica::{FastIca, GFunc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{DspError, Result};
use crate::signal::{first_non_finite, is_degenerate, mean_std};

/// Non-linearity function for FastICA
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GFunction {
    Logcosh,
    Exp,
    Cube,
}

impl Default for GFunction {
    fn default() -> Self {
        Self::Logcosh
    }
}

impl GFunction {
    fn to_linfa(self) -> GFunc {
        match self {
            GFunction::Logcosh => GFunc::Logcosh(1.0),
            GFunction::Exp => GFunc::Exp,
            GFunction::Cube => GFunc::Cube,
        }
    }
}

/// Parameters for ICA decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcaParameters {
    /// Number of components to extract; `None` keeps one per channel
    pub n_components: Option<usize>,
    pub g_function: GFunction,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub random_seed: Option<usize>,
}

impl Default for IcaParameters {
    fn default() -> Self {
        Self {
            n_components: None,
            g_function: GFunction::default(),
            max_iterations: 200,
            tolerance: 1e-4,
            random_seed: Some(42),
        }
    }
}

impl IcaParameters {
    /// Single-component decomposition, as used on one pulse window
    pub fn single_component() -> Self {
        Self {
            n_components: Some(1),
            ..Default::default()
        }
    }
}

/// ICA processor that wraps linfa-ica
pub struct IcaProcessor;

impl IcaProcessor {
    /// Fit FastICA on `data` (`n_samples x n_channels`) and return the
    /// estimated sources (`n_samples x n_components`).
    pub fn fit_transform(data: &Array2<f64>, params: &IcaParameters) -> Result<Array2<f64>> {
        let (n_samples, n_channels) = data.dim();
        if n_samples == 0 || n_channels == 0 {
            return Err(DspError::EmptyInput(format!(
                "ICA needs a non-empty matrix, got {} x {}",
                n_samples, n_channels
            )));
        }
        if let Some(idx) = first_non_finite(data.iter()) {
            return Err(DspError::NonFinite(idx));
        }

        // FastICA whitening cannot order the eigenvalues of a flat channel
        for (j, col) in data.columns().into_iter().enumerate() {
            let col = col.to_vec();
            let (mean, std) = mean_std(&col);
            if is_degenerate(&col, mean, std) {
                return Err(DspError::ZeroVariance(format!(
                    "channel {} is constant ({})",
                    j, mean
                )));
            }
        }

        let n_components = params.n_components.unwrap_or(n_channels);
        if n_components == 0 || n_components > n_channels {
            return Err(DspError::InvalidParameter(format!(
                "Number of components ({}) must be between 1 and the number of channels ({})",
                n_components, n_channels
            )));
        }

        log::debug!(
            "[ICA] FastICA on {} samples x {} channels: n_components={}, max_iter={}, tol={}",
            n_samples,
            n_channels,
            n_components,
            params.max_iterations,
            params.tolerance
        );

        let dataset = DatasetBase::from(data.clone());

        let mut ica = FastIca::params()
            .ncomponents(n_components)
            .gfunc(params.g_function.to_linfa())
            .max_iter(params.max_iterations)
            .tol(params.tolerance);
        if let Some(seed) = params.random_seed {
            ica = ica.random_state(seed);
        }

        let fitted = ica
            .fit(&dataset)
            .map_err(|e| DspError::Ica(format!("{:?}", e)))?;

        let sources = fitted.predict(data);

        if let Some(idx) = first_non_finite(sources.iter()) {
            return Err(DspError::Ica(format!(
                "decomposition produced a non-finite source value at index {}",
                idx
            )));
        }

        Ok(sources)
    }
}
