pub mod normalisers;
pub mod runner;
pub mod spec;

pub use normalisers::normalise;
pub use runner::{run_all, run_one, ScannerRunResult, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS};
