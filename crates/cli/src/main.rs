// posrecon - three-way security position reconciliation via OpenFIGI

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use posrecon_cli::exit_codes::EXIT_SUCCESS;
use posrecon_cli::{run, CliError, RunOptions};
use posrecon_figi_client::DEFAULT_BASE_URL;

#[derive(Parser)]
#[command(name = "posrecon")]
#[command(about = "Reconcile positions across fund admin, custodian, and external manager feeds")]
#[command(version)]
struct Cli {
    /// Fund administrator position feed (CSV)
    #[arg(long, value_name = "FILE")]
    fund_admin: PathBuf,

    /// Custodian position feed (CSV)
    #[arg(long, value_name = "FILE")]
    custodian: PathBuf,

    /// External manager position feed (CSV)
    #[arg(long, value_name = "FILE")]
    external_manager: PathBuf,

    /// Output workbook path (default: reconoutput_<timestamp>.xlsx)
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// OpenFIGI API key; raises the service rate limits
    #[arg(long, env = "OPENFIGI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Identifiers per mapping request (service cap is 100)
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Pause between mapping batches, in milliseconds
    #[arg(long, default_value_t = 250)]
    pause_ms: u64,

    /// Mapping endpoint override (for testing against a stub)
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Submit without the interactive confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Write only the pre-mapping sheet; no network calls
    #[arg(long)]
    skip_mapping: bool,

    /// Suppress stderr progress and summary output
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let opts = RunOptions {
        fund_admin: cli.fund_admin,
        custodian: cli.custodian,
        external_manager: cli.external_manager,
        output: cli.output,
        api_key: cli.api_key,
        batch_size: cli.batch_size,
        pause_ms: cli.pause_ms,
        base_url: cli.base_url,
        yes: cli.yes,
        skip_mapping: cli.skip_mapping,
        quiet: cli.quiet,
    };

    match run(&opts) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}
