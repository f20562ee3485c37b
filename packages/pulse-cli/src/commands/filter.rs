use crate::cli::FilterArgs;
use crate::exit_codes;
use crate::input;
use crate::output;

pub fn execute(args: FilterArgs) -> i32 {
    let data = match input::read_matrix(&args.file) {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    log::info!(
        "Band-pass {}-{} Hz, order {}, fs={} on {}x{}",
        args.lowcut,
        args.highcut,
        args.order,
        args.sr,
        data.len(),
        data[0].len()
    );

    match pulse_dsp::butter_bandpass_filter(&data, args.lowcut, args.highcut, args.sr, args.order)
    {
        Ok(rows) => output::emit(&rows, args.out.compact, args.out.output.as_deref()),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::INPUT_ERROR
        }
    }
}
