//! Batched OpenFIGI mapping client.
//!
//! Submits jobs in fixed-size batches, one batch at a time, with a fixed
//! pause between batches (the service is rate limited). A failed batch
//! degrades its own jobs to null results with error provenance and the
//! run continues; only a positionally misaligned success response aborts,
//! because silently misattributing results is worse than failing.

use std::thread;
use std::time::Duration;

use crate::job::MappingJob;

pub const DEFAULT_BASE_URL: &str = "https://api.openfigi.com/v3/mapping";
const USER_AGENT: &str = concat!("posrecon/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Static per-run client configuration. No process-wide settings.
#[derive(Debug, Clone)]
pub struct FigiConfig {
    pub base_url: String,
    /// Optional static API key, sent as `X-OPENFIGI-APIKEY`.
    pub api_key: Option<String>,
    /// Jobs per request. Service-imposed cap is 100.
    pub batch_size: usize,
    /// Fixed pause between consecutive batches.
    pub pause: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FigiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            batch_size: 100,
            pause: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for mapping operations.
///
/// Per-batch transport and status failures are NOT errors at this level;
/// they degrade to null outcomes with error provenance. Only structural
/// problems abort the run.
#[derive(Debug)]
pub enum FigiError {
    /// batch_size must be at least 1.
    Config(String),
    /// Service returned a success response whose array length does not
    /// match the submitted batch. Positional alignment is load-bearing;
    /// continuing would misattribute results to the wrong records.
    Misaligned { batch: usize, expected: usize, got: usize },
}

impl std::fmt::Display for FigiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FigiError::Config(msg) => write!(f, "client config error: {msg}"),
            FigiError::Misaligned { batch, expected, got } => write!(
                f,
                "mapping response misaligned in batch {batch}: sent {expected} jobs, got {got} results"
            ),
        }
    }
}

impl std::error::Error for FigiError {}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The fixed descriptive fields taken from one OpenFIGI match.
///
/// Every field is optional on the wire; numeric fields (coupon, …) are
/// stringified. When the service returns multiple candidates only the
/// first is kept (best-guess policy).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MappingResult {
    pub figi: Option<String>,
    pub composite_figi: Option<String>,
    pub security_type: Option<String>,
    pub security_type2: Option<String>,
    pub market_sector: Option<String>,
    pub exch_code: Option<String>,
    pub share_class_figi: Option<String>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub expiration: Option<String>,
    pub coupon: Option<String>,
    pub maturity: Option<String>,
    pub ticker: Option<String>,
    pub name: Option<String>,
}

impl MappingResult {
    /// Extract the descriptive fields from one element of the service's
    /// `data` array. Unknown extra fields are ignored.
    pub fn from_value(v: &serde_json::Value) -> Self {
        Self {
            figi: field_string(v, "figi"),
            composite_figi: field_string(v, "compositeFIGI"),
            security_type: field_string(v, "securityType"),
            security_type2: field_string(v, "securityType2"),
            market_sector: field_string(v, "marketSector"),
            exch_code: field_string(v, "exchCode"),
            share_class_figi: field_string(v, "shareClassFIGI"),
            currency: field_string(v, "currency"),
            status: field_string(v, "status"),
            expiration: field_string(v, "expiration"),
            coupon: field_string(v, "coupon"),
            maturity: field_string(v, "maturity"),
            ticker: field_string(v, "ticker"),
            name: field_string(v, "name"),
        }
    }
}

/// Stringify a field that may arrive as a string or a number.
fn field_string(v: &serde_json::Value, key: &str) -> Option<String> {
    match v.get(key) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Outcome of one mapping job: the chosen match (if any) plus the exact
/// request and raw response envelope for audit provenance. Always
/// populated, success or failure.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub result: Option<MappingResult>,
    pub request: serde_json::Value,
    pub response: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// OpenFIGI mapping client (blocking).
#[derive(Debug)]
pub struct FigiClient {
    http: reqwest::blocking::Client,
    config: FigiConfig,
}

impl FigiClient {
    pub fn new(config: FigiConfig) -> Result<Self, FigiError> {
        if config.batch_size == 0 {
            return Err(FigiError::Config("batch_size must be at least 1".into()));
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FigiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Map a sequence of jobs, batch by batch.
    ///
    /// Length- and order-preserving: returns exactly one [`JobOutcome`]
    /// per input job, in input order, even when every batch fails.
    pub fn map_jobs(&self, jobs: &[MappingJob]) -> Result<Vec<JobOutcome>, FigiError> {
        let mut outcomes: Vec<JobOutcome> = Vec::with_capacity(jobs.len());
        let total_batches = jobs.len().div_ceil(self.config.batch_size);

        for (batch_idx, batch) in jobs.chunks(self.config.batch_size).enumerate() {
            self.map_batch(batch_idx, total_batches, batch, &mut outcomes)?;

            // Fixed-rate throttle between batches; nothing to wait for
            // after the last one.
            if batch_idx + 1 < total_batches {
                thread::sleep(self.config.pause);
            }
        }

        Ok(outcomes)
    }

    fn map_batch(
        &self,
        batch_idx: usize,
        total_batches: usize,
        batch: &[MappingJob],
        outcomes: &mut Vec<JobOutcome>,
    ) -> Result<(), FigiError> {
        let payload: Vec<serde_json::Value> = batch.iter().map(|j| j.to_value()).collect();

        let mut req = self
            .http
            .post(&self.config.base_url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(ref key) = self.config.api_key {
            req = req.header("X-OPENFIGI-APIKEY", key);
        }

        let resp = match req.send() {
            Ok(resp) => resp,
            Err(e) => {
                eprintln!(
                    "warning: mapping batch {}/{} failed ({e}); {} job(s) degraded",
                    batch_idx + 1,
                    total_batches,
                    batch.len(),
                );
                degrade_batch(batch, &payload, &e.to_string(), outcomes);
                return Ok(());
            }
        };

        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();

        if !(200..300).contains(&status) {
            eprintln!(
                "warning: mapping batch {}/{} rejected (HTTP {status}); {} job(s) degraded",
                batch_idx + 1,
                total_batches,
                batch.len(),
            );
            degrade_batch(batch, &payload, &body, outcomes);
            return Ok(());
        }

        let envelopes = match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Array(arr)) => arr,
            _ => {
                // Non-JSON or non-array success body: treat like any
                // other malformed response and degrade the batch.
                eprintln!(
                    "warning: mapping batch {}/{} returned a malformed body; {} job(s) degraded",
                    batch_idx + 1,
                    total_batches,
                    batch.len(),
                );
                degrade_batch(batch, &payload, &body, outcomes);
                return Ok(());
            }
        };

        // The service contract is positional: envelope i answers job i.
        if envelopes.len() != batch.len() {
            return Err(FigiError::Misaligned {
                batch: batch_idx + 1,
                expected: batch.len(),
                got: envelopes.len(),
            });
        }

        for (request, envelope) in payload.into_iter().zip(envelopes) {
            let result = envelope
                .get("data")
                .and_then(|d| d.as_array())
                .and_then(|arr| arr.first())
                .map(MappingResult::from_value);
            outcomes.push(JobOutcome {
                result,
                request,
                response: envelope,
            });
        }

        Ok(())
    }
}

/// Resolve every job in a failed batch to a null result, with the error
/// body preserved as response provenance.
fn degrade_batch(
    batch: &[MappingJob],
    payload: &[serde_json::Value],
    error_body: &str,
    outcomes: &mut Vec<JobOutcome>,
) {
    debug_assert_eq!(batch.len(), payload.len());
    for request in payload {
        outcomes.push(JobOutcome {
            result: None,
            request: request.clone(),
            response: serde_json::json!({ "error": error_body }),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
