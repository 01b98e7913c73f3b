use serde::Serialize;

/// One OpenFIGI mapping job, derived 1:1 from an input position record.
///
/// Serializes to the wire shape the /v3/mapping endpoint expects:
/// `{"idType": "...", "idValue": "...", "exchCode": "..."}` with
/// `exchCode` omitted unless set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingJob {
    #[serde(rename = "idType")]
    pub id_type: String,
    #[serde(rename = "idValue")]
    pub id_value: String,
    #[serde(rename = "exchCode", skip_serializing_if = "Option::is_none")]
    pub exch_code: Option<String>,
}

impl MappingJob {
    /// Normalize a raw (identifier-type, identifier-value) pair into a
    /// mapping job.
    ///
    /// Total function: unrecognized identifier types degrade to
    /// `ID_BB_GLOBAL` rather than erroring. A failed lookup downstream
    /// (null result) is the error signal, not this classification.
    /// Bare tickers get an assumed US exchange code.
    pub fn for_identifier(id_type: &str, value: &str) -> Self {
        let id_value = value.trim().to_string();
        match id_type.trim().to_uppercase().as_str() {
            "ISIN" => Self::new("ID_ISIN", id_value),
            "CUSIP" => Self::new("ID_CUSIP", id_value),
            "SEDOL" => Self::new("ID_SEDOL", id_value),
            "TICKER" => Self {
                id_type: "TICKER".into(),
                id_value,
                exch_code: Some("US".into()),
            },
            _ => Self::new("ID_BB_GLOBAL", id_value),
        }
    }

    fn new(id_type: &str, id_value: String) -> Self {
        Self {
            id_type: id_type.into(),
            id_value,
            exch_code: None,
        }
    }

    /// The job as a JSON value, used both for the request payload and
    /// for per-record provenance.
    pub fn to_value(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("idType".into(), self.id_type.clone().into());
        obj.insert("idValue".into(), self.id_value.clone().into());
        if let Some(ref exch) = self.exch_code {
            obj.insert("exchCode".into(), exch.clone().into());
        }
        serde_json::Value::Object(obj)
    }
}
