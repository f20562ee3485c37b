use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod input;
mod output;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Estimate(args) => commands::estimate::execute(args),
        cli::Command::Detrend(args) => commands::detrend::execute(args),
        cli::Command::Filter(args) => commands::filter::execute(args),
        cli::Command::Spectrum(args) => commands::spectrum::execute(args),
        cli::Command::Freqs(args) => commands::freqs::execute(args),
    };

    std::process::exit(exit_code);
}
