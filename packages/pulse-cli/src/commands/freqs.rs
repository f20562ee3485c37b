use crate::cli::FreqsArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: FreqsArgs) -> i32 {
    match pulse_dsp::fftfreq(args.n, args.spacing) {
        Ok(freqs) => output::emit(&freqs, args.out.compact, args.out.output.as_deref()),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::INPUT_ERROR
        }
    }
}
