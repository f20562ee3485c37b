//! C bindings for pulse-dsp.
//!
//! Exposes the four host operations over a C ABI with the host's argument
//! order. 2-D data travels as a row-major buffer plus `rows`/`cols`; every
//! result owns its buffers and must be released with the matching
//! `pulse_*_free` function.

#![allow(non_snake_case)]

use std::ffi::{CString, c_char};
use std::os::raw::{c_double, c_int};
use std::panic::{catch_unwind, UnwindSafe};
use std::ptr;

use pulse_dsp::shim;

/// 2-D result matrix, row-major.
#[repr(C)]
pub struct PulseMatrix {
    /// `rows * cols` values (NULL on error)
    pub data: *mut c_double,
    pub rows: usize,
    pub cols: usize,
    /// Error message (NULL if no error)
    pub error: *mut c_char,
}

/// 1-D result array.
#[repr(C)]
pub struct PulseArray {
    /// `len` values (NULL on error)
    pub data: *mut c_double,
    pub len: usize,
    /// Error message (NULL if no error)
    pub error: *mut c_char,
}

impl Default for PulseMatrix {
    fn default() -> Self {
        PulseMatrix {
            data: ptr::null_mut(),
            rows: 0,
            cols: 0,
            error: ptr::null_mut(),
        }
    }
}

impl Default for PulseArray {
    fn default() -> Self {
        PulseArray {
            data: ptr::null_mut(),
            len: 0,
            error: ptr::null_mut(),
        }
    }
}

/// Convert a Vec<f64> to a raw pointer.
fn vec_to_ptr(v: Vec<f64>) -> *mut c_double {
    let boxed = v.into_boxed_slice();
    Box::into_raw(boxed) as *mut c_double
}

fn error_ptr(msg: &str) -> *mut c_char {
    CString::new(msg.replace('\0', " "))
        .unwrap_or_default()
        .into_raw()
}

fn matrix_error(msg: &str) -> PulseMatrix {
    PulseMatrix {
        error: error_ptr(msg),
        ..Default::default()
    }
}

fn array_error(msg: &str) -> PulseArray {
    PulseArray {
        error: error_ptr(msg),
        ..Default::default()
    }
}

fn matrix_result(result: pulse_dsp::Result<Vec<Vec<f64>>>) -> PulseMatrix {
    match result {
        Ok(rows) => {
            let n_rows = rows.len();
            let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
            let flat: Vec<f64> = rows.into_iter().flatten().collect();
            PulseMatrix {
                data: vec_to_ptr(flat),
                rows: n_rows,
                cols: n_cols,
                error: ptr::null_mut(),
            }
        }
        Err(e) => matrix_error(&e.to_string()),
    }
}

/// Run `f`, turning a panic into an error message instead of unwinding
/// into the host.
fn guarded<T, F>(name: &str, f: F, on_error: fn(&str) -> T) -> T
where
    F: FnOnce() -> T + UnwindSafe,
{
    catch_unwind(f).unwrap_or_else(|_| {
        log::error!("{} panicked", name);
        on_error(&format!("{} panicked", name))
    })
}

/// Copy a row-major `rows x cols` buffer into row vectors.
unsafe fn read_matrix(data: *const c_double, rows: usize, cols: usize) -> Option<Vec<Vec<f64>>> {
    if rows == 0 {
        return Some(Vec::new());
    }
    if data.is_null() || cols == 0 {
        return None;
    }
    let total = rows.checked_mul(cols)?;
    let flat = std::slice::from_raw_parts(data, total);
    Some(flat.chunks_exact(cols).map(|r| r.to_vec()).collect())
}

/// ICA-based detrend of a window of `len` samples (must be 150).
///
/// # Safety
/// `window` must point to `len` readable doubles.
#[no_mangle]
pub unsafe extern "C" fn get_detrend(window: *const c_double, len: usize, unused: bool) -> PulseMatrix {
    if window.is_null() {
        return matrix_error("window pointer is null");
    }
    let window = std::slice::from_raw_parts(window, len).to_vec();
    guarded(
        "get_detrend",
        move || matrix_result(shim::get_detrend(&window, unused)),
        matrix_error,
    )
}

/// Butterworth band-pass along the time axis (rows) of a row-major matrix.
///
/// # Safety
/// `data` must point to `rows * cols` readable doubles.
#[no_mangle]
pub unsafe extern "C" fn butter_bandpass_filter(
    data: *const c_double,
    rows: usize,
    cols: usize,
    lowcut: c_double,
    highcut: c_double,
    fs: c_double,
    order: c_int,
) -> PulseMatrix {
    let Some(matrix) = read_matrix(data, rows, cols) else {
        return matrix_error("invalid data inputs");
    };
    guarded(
        "butter_bandpass_filter",
        move || {
            matrix_result(shim::butter_bandpass_filter(
                &matrix, lowcut, highcut, fs, order,
            ))
        },
        matrix_error,
    )
}

/// Squared DFT magnitude along the time axis (rows) of a row-major matrix.
///
/// # Safety
/// `y` must point to `rows * cols` readable doubles.
#[no_mangle]
pub unsafe extern "C" fn get_powerSpec(
    y: *const c_double,
    rows: usize,
    cols: usize,
    unused: bool,
) -> PulseMatrix {
    let Some(matrix) = read_matrix(y, rows, cols) else {
        return matrix_error("invalid data inputs");
    };
    guarded(
        "get_powerSpec",
        move || matrix_result(shim::get_powerSpec(&matrix, unused)),
        matrix_error,
    )
}

/// DFT sample frequencies.
#[no_mangle]
pub extern "C" fn fftfreq(n: c_int, spacing: c_double) -> PulseArray {
    guarded(
        "fftfreq",
        move || match shim::fftfreq(n, spacing) {
            Ok(freqs) => PulseArray {
                len: freqs.len(),
                data: vec_to_ptr(freqs),
                error: ptr::null_mut(),
            },
            Err(e) => array_error(&e.to_string()),
        },
        array_error,
    )
}

/// Free a PulseMatrix.
///
/// # Safety
/// `result` must be null or point to a PulseMatrix returned by this library
/// that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn pulse_matrix_free(result: *mut PulseMatrix) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    if !r.data.is_null() {
        let n = r.rows * r.cols;
        let _ = Box::from_raw(ptr::slice_from_raw_parts_mut(r.data, n));
        r.data = ptr::null_mut();
    }
    if !r.error.is_null() {
        let _ = CString::from_raw(r.error);
        r.error = ptr::null_mut();
    }
    r.rows = 0;
    r.cols = 0;
}

/// Free a PulseArray.
///
/// # Safety
/// `result` must be null or point to a PulseArray returned by this library
/// that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn pulse_array_free(result: *mut PulseArray) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    if !r.data.is_null() {
        let _ = Box::from_raw(ptr::slice_from_raw_parts_mut(r.data, r.len));
        r.data = ptr::null_mut();
    }
    if !r.error.is_null() {
        let _ = CString::from_raw(r.error);
        r.error = ptr::null_mut();
    }
    r.len = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::f64::consts::PI;

    unsafe fn matrix_values(m: &PulseMatrix) -> Vec<f64> {
        std::slice::from_raw_parts(m.data, m.rows * m.cols).to_vec()
    }

    #[test]
    fn test_fftfreq() {
        let mut out = fftfreq(4, 1.0);
        assert!(out.error.is_null());
        let values = unsafe { std::slice::from_raw_parts(out.data, out.len) }.to_vec();
        assert_eq!(values, vec![0.0, 0.25, -0.5, -0.25]);
        unsafe { pulse_array_free(&mut out) };
        assert!(out.data.is_null());
    }

    #[test]
    fn test_fftfreq_error_message() {
        let mut out = fftfreq(0, 1.0);
        assert!(out.data.is_null());
        let msg = unsafe { CStr::from_ptr(out.error) }.to_str().unwrap().to_string();
        assert!(msg.contains("Invalid parameter"), "{}", msg);
        unsafe { pulse_array_free(&mut out) };
    }

    #[test]
    fn test_power_spectrum_row_major() {
        // 4 samples x 2 channels
        let data = [1.0, 0.0, 2.0, 1.0, 3.0, 0.0, 4.0, -1.0];
        let mut out = unsafe { get_powerSpec(data.as_ptr(), 4, 2, true) };
        assert!(out.error.is_null());
        assert_eq!((out.rows, out.cols), (4, 2));
        let values = unsafe { matrix_values(&out) };
        let expected = [100.0, 0.0, 8.0, 4.0, 4.0, 0.0, 8.0, 4.0];
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-9);
        }
        unsafe { pulse_matrix_free(&mut out) };
    }

    #[test]
    fn test_detrend_and_filter_chain() {
        let window: Vec<f64> = (0..150)
            .map(|t| 50.0 + 0.1 * t as f64 + (2.0 * PI * 1.5 * t as f64 / 30.0).sin())
            .collect();
        let mut detrended = unsafe { get_detrend(window.as_ptr(), window.len(), true) };
        assert!(detrended.error.is_null());
        assert_eq!((detrended.rows, detrended.cols), (150, 1));

        let mut filtered = unsafe {
            butter_bandpass_filter(detrended.data, detrended.rows, detrended.cols, 0.75, 4.0, 30.0, 4)
        };
        assert!(filtered.error.is_null());
        assert_eq!((filtered.rows, filtered.cols), (150, 1));

        unsafe {
            pulse_matrix_free(&mut detrended);
            pulse_matrix_free(&mut filtered);
        }
    }

    #[test]
    fn test_detrend_constant_reports_error() {
        for v in [3.0, 0.1, 123.456] {
            let window = [v; 150];
            let mut out = unsafe { get_detrend(window.as_ptr(), window.len(), true) };
            assert!(out.data.is_null());
            let msg = unsafe { CStr::from_ptr(out.error) }.to_str().unwrap().to_string();
            assert!(msg.contains("Zero variance"), "{}", msg);
            unsafe { pulse_matrix_free(&mut out) };
        }
    }

    #[test]
    fn test_null_pointers() {
        let mut out = unsafe { get_detrend(ptr::null(), 150, true) };
        assert!(!out.error.is_null());
        unsafe { pulse_matrix_free(&mut out) };

        let mut out = unsafe { butter_bandpass_filter(ptr::null(), 10, 1, 0.75, 4.0, 30.0, 4) };
        assert!(!out.error.is_null());
        unsafe { pulse_matrix_free(&mut out) };

        unsafe { pulse_matrix_free(ptr::null_mut()) };
    }
}
