//! Conversions between host-shaped 2-D sequences and `ndarray` matrices,
//! plus z-score normalization.
//!
//! A 2-D sequence is row-major with one row per sample (time) and one column
//! per channel, so `rows[t][c]` maps to `matrix[[t, c]]`.

use ndarray::Array2;

use crate::error::{DspError, Result};

/// Build a `(n_rows, n_cols)` matrix from row vectors. All rows must have the
/// same length.
pub fn to_array2(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(DspError::ShapeMismatch(format!(
            "row {} has {} columns, expected {}",
            i,
            row.len(),
            n_cols
        )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| DspError::ShapeMismatch(e.to_string()))
}

/// Convert a matrix back into row vectors.
pub fn from_array2(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Index of the first NaN or infinite sample, if any.
pub fn first_non_finite<'a, I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a f64>,
{
    values.into_iter().position(|x| !x.is_finite())
}

/// Mean and population standard deviation (ddof = 0).
pub fn mean_std(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let var = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Relative spread below which a signal counts as constant.
const ZERO_VARIANCE_TOL: f64 = 1e-12;

/// True when every sample is equal, or when the standard deviation is only
/// rounding noise relative to the signal level. The mean of a constant that is
/// not exactly representable (0.1, say) is off by an ulp, so `std` is tiny but
/// non-zero.
pub fn is_degenerate(data: &[f64], mean: f64, std: f64) -> bool {
    let all_equal = data.windows(2).all(|w| w[0] == w[1]);
    all_equal || !std.is_finite() || std <= ZERO_VARIANCE_TOL * mean.abs().max(1.0)
}

/// Z-score normalize: subtract the mean, divide by the population standard
/// deviation.
///
/// A constant signal has no defined normalization and is rejected with
/// [`DspError::ZeroVariance`] instead of producing NaNs.
pub fn zscore(data: &[f64]) -> Result<Vec<f64>> {
    if data.is_empty() {
        return Err(DspError::EmptyInput("cannot normalize an empty signal".into()));
    }
    if let Some(idx) = first_non_finite(data) {
        return Err(DspError::NonFinite(idx));
    }

    let (mean, std) = mean_std(data);
    if is_degenerate(data, mean, std) {
        return Err(DspError::ZeroVariance(format!(
            "standard deviation of {} samples is {:e} around a mean of {}",
            data.len(),
            std,
            mean
        )));
    }

    Ok(data.iter().map(|&x| (x - mean) / std).collect())
}

/// Z-score every column of a matrix independently.
pub fn zscore_columns(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let mut out = matrix.clone();
    for (j, mut col) in out.columns_mut().into_iter().enumerate() {
        let normalized = zscore(&col.to_vec()).map_err(|e| match e {
            DspError::ZeroVariance(msg) => {
                DspError::ZeroVariance(format!("column {}: {}", j, msg))
            }
            other => other,
        })?;
        for (dst, src) in col.iter_mut().zip(normalized) {
            *dst = src;
        }
    }
    Ok(out)
}
