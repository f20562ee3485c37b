use crate::cli::SpectrumArgs;
use crate::exit_codes;
use crate::input;
use crate::output;
use serde::Serialize;

#[derive(Serialize)]
struct SpectrumOutput {
    power: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequencies: Option<Vec<f64>>,
}

pub fn execute(args: SpectrumArgs) -> i32 {
    let data = match input::read_matrix(&args.file) {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let power = match pulse_dsp::get_powerSpec(&data, true) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let frequencies = match args.sr {
        Some(sr) if sr <= 0.0 || !sr.is_finite() => {
            eprintln!("Error: sampling rate must be positive, got {}", sr);
            return exit_codes::INPUT_ERROR;
        }
        Some(sr) => match pulse_dsp::fftfreq(power.len() as i32, 1.0 / sr) {
            Ok(f) => Some(f),
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::INPUT_ERROR;
            }
        },
        None => None,
    };

    output::emit(
        &SpectrumOutput { power, frequencies },
        args.out.compact,
        args.out.output.as_deref(),
    )
}
