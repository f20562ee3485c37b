use clap::{Args, Parser, Subcommand, ValueEnum};
use pulse_dsp::detrend::DetrendType;

#[derive(Parser)]
#[command(
    name = "pulse",
    version,
    about = "Pulse-rate signal processing command-line tool",
    long_about = "Estimate pulse rate from per-frame color samples and run the underlying\n\
                  operations (ICA detrend, Butterworth band-pass, power spectrum) on text files.\n\
                  Input files hold one sample per line; 2-D inputs hold one row per line with\n\
                  comma or whitespace separated channels."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Estimate pulse rate over a sample stream
    Estimate(EstimateArgs),
    /// ICA-detrend one 150-sample window
    Detrend(DetrendArgs),
    /// Butterworth band-pass each column along time
    Filter(FilterArgs),
    /// Power spectrum of each column along time
    Spectrum(SpectrumArgs),
    /// DFT sample frequencies
    Freqs(FreqsArgs),
}

/// Trend removed after ICA
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DetrendKind {
    Linear,
    Constant,
}

impl From<DetrendKind> for DetrendType {
    fn from(kind: DetrendKind) -> Self {
        match kind {
            DetrendKind::Linear => DetrendType::Linear,
            DetrendKind::Constant => DetrendType::Constant,
        }
    }
}

#[derive(Args)]
pub struct OutputArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Args)]
pub struct EstimateArgs {
    /// Input sample file
    #[arg(long)]
    pub file: String,

    /// JSON pipeline configuration
    #[arg(long, env = "PULSE_CONFIG")]
    pub config: Option<String>,

    /// Sampling rate in Hz (overrides the configuration)
    #[arg(long, env = "PULSE_SAMPLE_RATE")]
    pub sr: Option<f64>,

    /// Lower band edge in Hz (overrides the configuration)
    #[arg(long)]
    pub lowcut: Option<f64>,

    /// Upper band edge in Hz (overrides the configuration)
    #[arg(long)]
    pub highcut: Option<f64>,

    /// Samples between estimates (overrides the configuration)
    #[arg(long)]
    pub step: Option<usize>,

    /// Trend removed after ICA (overrides the configuration)
    #[arg(long, value_enum)]
    pub detrend: Option<DetrendKind>,

    /// Also log `end_sample,time_s,bpm` rows to this CSV file
    #[arg(long)]
    pub csv: Option<String>,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Args)]
pub struct DetrendArgs {
    /// Input sample file (150 samples)
    #[arg(long)]
    pub file: String,

    /// Trend removed after ICA
    #[arg(long, value_enum, default_value_t = DetrendKind::Linear)]
    pub kind: DetrendKind,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Input matrix file (rows are samples)
    #[arg(long)]
    pub file: String,

    /// Lower band edge in Hz
    #[arg(long, default_value_t = 0.75)]
    pub lowcut: f64,

    /// Upper band edge in Hz
    #[arg(long, default_value_t = 4.0)]
    pub highcut: f64,

    /// Sampling rate in Hz
    #[arg(long, env = "PULSE_SAMPLE_RATE", default_value_t = 30.0)]
    pub sr: f64,

    /// Butterworth order
    #[arg(long, default_value_t = 4)]
    pub order: i32,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Args)]
pub struct SpectrumArgs {
    /// Input matrix file (rows are samples)
    #[arg(long)]
    pub file: String,

    /// Sampling rate in Hz; when given, bin frequencies are included
    #[arg(long, env = "PULSE_SAMPLE_RATE")]
    pub sr: Option<f64>,

    #[command(flatten)]
    pub out: OutputArgs,
}

#[derive(Args)]
pub struct FreqsArgs {
    /// Number of bins
    #[arg(long)]
    pub n: i32,

    /// Sample spacing (1 / sampling rate)
    #[arg(long, default_value_t = 1.0)]
    pub spacing: f64,

    #[command(flatten)]
    pub out: OutputArgs,
}
