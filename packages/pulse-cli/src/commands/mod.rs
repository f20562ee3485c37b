pub mod detrend;
pub mod estimate;
pub mod filter;
pub mod freqs;
pub mod spectrum;
