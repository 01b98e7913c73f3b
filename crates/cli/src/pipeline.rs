// End-to-end reconciliation run: load feeds, map identifiers, reconcile,
// write the workbook. All progress goes to stderr; stdout stays clean.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use posrecon_figi_client::{FigiClient, FigiConfig};
use posrecon_io::{default_output_path, write_report};
use posrecon_recon::{build_jobs, enrich, load_positions, reconcile};
use posrecon_recon::{PositionRecord, ReconError, Source};

use crate::exit_codes::{EXIT_INPUT, EXIT_MAPPING, EXIT_OUTPUT, EXIT_USAGE};

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self { code: EXIT_MAPPING, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }
}

/// Resolved run options. Flag parsing and env lookup happen in `main`;
/// everything here is already concrete.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fund_admin: PathBuf,
    pub custodian: PathBuf,
    pub external_manager: PathBuf,
    pub output: Option<PathBuf>,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub pause_ms: u64,
    pub base_url: String,
    pub yes: bool,
    pub skip_mapping: bool,
    pub quiet: bool,
}

pub fn run(opts: &RunOptions) -> Result<(), CliError> {
    let show_progress = !opts.quiet && atty::is(atty::Stream::Stderr);

    let records = load_all_feeds(opts, show_progress)?;

    let output_path = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_path()));

    let proceed = if opts.skip_mapping {
        false
    } else if opts.yes {
        true
    } else {
        confirm_submission(records.len(), &opts.base_url)?
    };

    // Declined or skipped: the raw data still gets written, only the
    // mapping/reconciliation core is short-circuited.
    if !proceed {
        write_report(&output_path, &records, None).map_err(CliError::output)?;
        if !opts.quiet {
            eprintln!(
                "Mapping skipped; wrote pre-mapping workbook with {} record(s) to {}",
                records.len(),
                output_path.display()
            );
        }
        return Ok(());
    }

    let client = FigiClient::new(FigiConfig {
        base_url: opts.base_url.clone(),
        api_key: opts.api_key.clone(),
        batch_size: opts.batch_size,
        pause: Duration::from_millis(opts.pause_ms),
        ..FigiConfig::default()
    })
    .map_err(|e| CliError::usage(e.to_string()))?;

    let jobs = build_jobs(&records);
    if show_progress {
        eprintln!(
            "Submitting {} identifier(s) in {} batch(es)...",
            jobs.len(),
            jobs.len().div_ceil(opts.batch_size.max(1)),
        );
    }

    let outcomes = client.map_jobs(&jobs).map_err(|e| CliError::mapping(e.to_string()))?;
    let enriched = enrich(&records, &outcomes).map_err(|e| CliError::mapping(e.to_string()))?;

    let report = reconcile(&enriched).map_err(|e| {
        let msg = e.to_string();
        match e {
            ReconError::QuantityParse { .. } => CliError::input(msg),
            _ => CliError::mapping(msg),
        }
    })?;

    write_report(&output_path, &records, Some(&report)).map_err(CliError::output)?;

    if !opts.quiet {
        let s = &report.summary;
        eprintln!(
            "Reconciled {} group(s): {} matched, {} mismatched; {} unmapped record(s)",
            s.groups, s.matched, s.mismatched, s.unmapped_records
        );
        eprintln!("Wrote {}", output_path.display());
    }

    Ok(())
}

fn load_all_feeds(opts: &RunOptions, show_progress: bool) -> Result<Vec<PositionRecord>, CliError> {
    let feeds = [
        (&opts.fund_admin, Source::FundAdmin),
        (&opts.custodian, Source::Custodian),
        (&opts.external_manager, Source::ExternalManager),
    ];

    let mut records = Vec::new();
    for (path, source) in feeds {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::input(format!("cannot read {}: {e}", path.display())))?;
        let mut rows =
            load_positions(&text, source).map_err(|e| CliError::input(e.to_string()))?;
        if show_progress {
            eprintln!("Loaded {} {source} position(s) from {}", rows.len(), path.display());
        }
        records.append(&mut rows);
    }

    Ok(records)
}

/// Interactive y/N gate before any network submission. Defaults to no.
///
/// Without a tty on stdin there is nobody to ask, so the run refuses
/// rather than guessing; `--yes` is the scriptable path.
fn confirm_submission(record_count: usize, base_url: &str) -> Result<bool, CliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "confirmation required before submitting identifiers".into(),
            hint: Some("pass --yes to submit without prompting, or --skip-mapping to stay offline".into()),
        });
    }

    eprint!(
        "About to submit {record_count} identifier(s) to {base_url}. Continue? [y/N] "
    );
    io::stderr().flush().ok();

    let mut buf = String::new();
    io::stdin()
        .lock()
        .read_line(&mut buf)
        .map_err(|e| CliError::usage(format!("cannot read confirmation: {e}")))?;

    let answer = buf.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
