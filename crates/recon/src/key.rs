use crate::model::EnrichedRecord;

/// Shared sentinel key for records the mapping service could not
/// resolve. Keeping them in one group keeps every unresolved record
/// visible and auditable together instead of scattering singletons.
pub const UNMAPPED_KEY: &str = "NO_FIGI_MAPPING";

/// Canonical reconciliation key for an enriched record.
///
/// Precedence: trimmed non-blank compositeFIGI, else trimmed non-blank
/// FIGI, else [`UNMAPPED_KEY`]. Total and deterministic.
pub fn recon_key(record: &EnrichedRecord) -> &str {
    non_blank(record.composite_figi.as_deref())
        .or_else(|| non_blank(record.figi.as_deref()))
        .unwrap_or(UNMAPPED_KEY)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    fn enriched(composite: Option<&str>, figi: Option<&str>) -> EnrichedRecord {
        EnrichedRecord {
            source: Source::FundAdmin,
            security_id: "X".into(),
            id_type: "ISIN".into(),
            quantity: "1".into(),
            price: "".into(),
            security_name: "".into(),
            figi: figi.map(String::from),
            composite_figi: composite.map(String::from),
            security_type: None,
            security_type2: None,
            market_sector: None,
            exch_code: None,
            share_class_figi: None,
            currency: None,
            status: None,
            expiration: None,
            coupon: None,
            maturity: None,
            ticker: None,
            name: None,
            request: "{}".into(),
            response: "{}".into(),
        }
    }

    #[test]
    fn composite_takes_precedence() {
        let rec = enriched(Some("BBG000BLNNH6"), Some("BBG000BLNNH5"));
        assert_eq!(recon_key(&rec), "BBG000BLNNH6");
    }

    #[test]
    fn falls_back_to_figi() {
        let rec = enriched(None, Some("BBG000BLNNH5"));
        assert_eq!(recon_key(&rec), "BBG000BLNNH5");

        let rec = enriched(Some("   "), Some("BBG000BLNNH5"));
        assert_eq!(recon_key(&rec), "BBG000BLNNH5");
    }

    #[test]
    fn blank_both_is_unmapped() {
        assert_eq!(recon_key(&enriched(None, None)), UNMAPPED_KEY);
        assert_eq!(recon_key(&enriched(Some(""), Some("  "))), UNMAPPED_KEY);
    }

    #[test]
    fn key_is_trimmed() {
        let rec = enriched(Some("  BBG000BLNNH6  "), None);
        assert_eq!(recon_key(&rec), "BBG000BLNNH6");
    }
}
