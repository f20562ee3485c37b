use crate::cli::EstimateArgs;
use crate::exit_codes;
use crate::input;
use crate::output;
use pulse_dsp::{PulseConfig, PulseEstimate, PulseTracker};
use serde::Serialize;

#[derive(Serialize)]
struct TimedEstimate {
    /// Index one past the last sample of the window
    end_sample: usize,
    #[serde(flatten)]
    estimate: PulseEstimate,
}

/// One row of the pulse-rate log
#[derive(Serialize)]
struct CsvRecord {
    end_sample: usize,
    time_s: f64,
    bpm: f64,
}

#[derive(Serialize)]
struct EstimateOutput {
    sample_rate: f64,
    window_len: usize,
    step: usize,
    estimates: Vec<TimedEstimate>,
    failed_windows: usize,
}

fn resolve_config(args: &EstimateArgs) -> Result<PulseConfig, String> {
    let mut config = match &args.config {
        Some(path) => PulseConfig::from_file(path)
            .map_err(|e| format!("Invalid configuration '{}': {}", path, e))?,
        None => PulseConfig::default(),
    };
    if let Some(sr) = args.sr {
        config.sample_rate = sr;
    }
    if let Some(lowcut) = args.lowcut {
        config.lowcut = lowcut;
    }
    if let Some(highcut) = args.highcut {
        config.highcut = highcut;
    }
    if let Some(step) = args.step {
        config.step = step;
    }
    if let Some(kind) = args.detrend {
        config.detrend = kind.into();
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

pub fn execute(args: EstimateArgs) -> i32 {
    let config = match resolve_config(&args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let samples = match input::read_samples(&args.file) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };
    if samples.len() < config.window_len {
        eprintln!(
            "Error: {} samples in '{}', need at least {} for one window",
            samples.len(),
            args.file,
            config.window_len
        );
        return exit_codes::INPUT_ERROR;
    }

    log::info!(
        "Estimating pulse over {} samples at {} Hz (window={}, step={})",
        samples.len(),
        config.sample_rate,
        config.window_len,
        config.step
    );

    let mut result = EstimateOutput {
        sample_rate: config.sample_rate,
        window_len: config.window_len,
        step: config.step,
        estimates: Vec::new(),
        failed_windows: 0,
    };
    let mut tracker = match PulseTracker::new(config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let mut last_error = None;
    for &x in &samples {
        match tracker.push(x) {
            Ok(Some(estimate)) => result.estimates.push(TimedEstimate {
                end_sample: tracker.samples_seen(),
                estimate,
            }),
            Ok(None) => {}
            Err(e) => {
                log::warn!(
                    "Window ending at sample {} failed: {}",
                    tracker.samples_seen(),
                    e
                );
                result.failed_windows += 1;
                last_error = Some(e);
            }
        }
    }

    if result.estimates.is_empty() {
        if let Some(e) = last_error {
            eprintln!("Error: no window produced an estimate: {}", e);
        }
        return exit_codes::INPUT_ERROR;
    }

    if let Some(path) = &args.csv {
        let records: Vec<CsvRecord> = result
            .estimates
            .iter()
            .map(|e| CsvRecord {
                end_sample: e.end_sample,
                time_s: e.end_sample as f64 / result.sample_rate,
                bpm: e.estimate.bpm,
            })
            .collect();
        if let Err(msg) = output::write_csv(&records, path) {
            eprintln!("Error: {}", msg);
            return exit_codes::EXECUTION_ERROR;
        }
        log::info!("Wrote {} pulse-rate rows to {}", records.len(), path);
    }

    output::emit(&result, args.out.compact, args.out.output.as_deref())
}
