use crate::cli::DetrendArgs;
use crate::exit_codes;
use crate::input;
use crate::output;
use pulse_dsp::ica::IcaParameters;
use pulse_dsp::shim::detrend_window;
use pulse_dsp::signal::from_array2;
use pulse_dsp::WINDOW_LEN;

pub fn execute(args: DetrendArgs) -> i32 {
    let window = match input::read_samples(&args.file) {
        Ok(w) => w,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    log::info!("Detrending {} samples ({:?})", window.len(), args.kind);

    let params = IcaParameters::single_component();
    match detrend_window(&window, WINDOW_LEN, &params, args.kind.into()) {
        Ok(matrix) => output::emit(
            &from_array2(&matrix),
            args.out.compact,
            args.out.output.as_deref(),
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::INPUT_ERROR
        }
    }
}
