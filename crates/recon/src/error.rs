use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// Missing required column in an input feed.
    MissingColumn { source: String, column: String },
    /// CSV read error.
    Io(String),
    /// Enrichment received a different number of mapping outcomes than
    /// input records. A structural integrity violation, never degraded.
    LengthMismatch { records: usize, outcomes: usize },
    /// A reported quantity failed to parse as a decimal while computing
    /// a group total. Fatal: a coerced zero would hide a real break.
    QuantityParse { source: String, security_id: String, value: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { source, column } => {
                write!(f, "feed '{source}': missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::LengthMismatch { records, outcomes } => {
                write!(f, "{records} record(s) but {outcomes} mapping outcome(s); refusing to misattribute results")
            }
            Self::QuantityParse { source, security_id, value } => {
                write!(f, "source '{source}', security '{security_id}': cannot parse quantity '{value}'")
            }
        }
    }
}

impl std::error::Error for ReconError {}
