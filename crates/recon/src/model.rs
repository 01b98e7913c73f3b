use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The three independent parties contributing position feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    FundAdmin,
    Custodian,
    ExternalManager,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::FundAdmin, Source::Custodian, Source::ExternalManager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::FundAdmin => "FundAdmin",
            Source::Custodian => "Custodian",
            Source::ExternalManager => "ExternalManager",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One position row as reported by one source. Quantity and price stay
/// as reported strings; numeric parsing is deferred to aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    pub source: Source,
    pub security_id: String,
    pub id_type: String,
    pub quantity: String,
    pub price: String,
    pub security_name: String,
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// A position record plus its mapping outcome. Exactly one per input
/// record, in input order, whether or not the lookup succeeded.
///
/// The descriptive fields are all `None` for unmapped records, so the
/// schema is uniform either way. `request` and `response` hold the
/// serialized mapping provenance and are always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub source: Source,
    pub security_id: String,
    pub id_type: String,
    pub quantity: String,
    pub price: String,
    pub security_name: String,

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

    pub request: String,
    pub response: String,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One row of the reconciliation result sheet. Summary and detail rows
/// share this schema; cells that don't apply are empty strings, so every
/// row always has the full column set. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub recon_key: String,
    pub security_name: String,
    pub market_sector: String,
    pub currency: String,
    pub security_type: String,
    pub total_quantity: String,
    pub match_status: String,
    pub source: String,
    pub security_id: String,
    pub id_type: String,
    pub quantity: String,
    pub price: String,
    pub figi: String,
    pub exch_code: String,
    pub share_class_figi: String,
    pub status: String,
    pub request: String,
    pub response: String,
}

impl OutputRow {
    /// A row with every cell blank; builders fill in what applies.
    pub(crate) fn blank() -> Self {
        Self {
            recon_key: String::new(),
            security_name: String::new(),
            market_sector: String::new(),
            currency: String::new(),
            security_type: String::new(),
            total_quantity: String::new(),
            match_status: String::new(),
            source: String::new(),
            security_id: String::new(),
            id_type: String::new(),
            quantity: String::new(),
            price: String::new(),
            figi: String::new(),
            exch_code: String::new(),
            share_class_figi: String::new(),
            status: String::new(),
            request: String::new(),
            response: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    /// Mapped groups only; the unmapped sentinel group is not counted.
    pub groups: usize,
    pub matched: usize,
    pub mismatched: usize,
    /// Records that fell into the unmapped sentinel group.
    pub unmapped_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<OutputRow>,
}
