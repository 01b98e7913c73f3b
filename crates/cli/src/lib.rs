// posrecon CLI - three-way position reconciliation, headless

pub mod exit_codes;
pub mod pipeline;

pub use pipeline::{run, CliError, RunOptions};
