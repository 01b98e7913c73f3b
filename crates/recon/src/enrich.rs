use posrecon_figi_client::{JobOutcome, MappingJob};

use crate::error::ReconError;
use crate::model::{EnrichedRecord, PositionRecord};

/// Derive one mapping job per position record, in input order.
pub fn build_jobs(records: &[PositionRecord]) -> Vec<MappingJob> {
    records
        .iter()
        .map(|r| MappingJob::for_identifier(&r.id_type, &r.security_id))
        .collect()
}

/// Merge mapping outcomes back onto their originating records.
///
/// Length- and order-preserving: outcome i belongs to record i. A length
/// mismatch means the alignment contract was broken upstream and is a
/// fatal integrity error.
pub fn enrich(
    records: &[PositionRecord],
    outcomes: &[JobOutcome],
) -> Result<Vec<EnrichedRecord>, ReconError> {
    if records.len() != outcomes.len() {
        return Err(ReconError::LengthMismatch {
            records: records.len(),
            outcomes: outcomes.len(),
        });
    }

    Ok(records
        .iter()
        .zip(outcomes)
        .map(|(record, outcome)| {
            let result = outcome.result.clone().unwrap_or_default();
            EnrichedRecord {
                source: record.source,
                security_id: record.security_id.clone(),
                id_type: record.id_type.clone(),
                quantity: record.quantity.clone(),
                price: record.price.clone(),
                security_name: record.security_name.clone(),
                figi: result.figi,
                composite_figi: result.composite_figi,
                security_type: result.security_type,
                security_type2: result.security_type2,
                market_sector: result.market_sector,
                exch_code: result.exch_code,
                share_class_figi: result.share_class_figi,
                currency: result.currency,
                status: result.status,
                expiration: result.expiration,
                coupon: result.coupon,
                maturity: result.maturity,
                ticker: result.ticker,
                name: result.name,
                request: outcome.request.to_string(),
                response: outcome.response.to_string(),
            }
        })
        .collect())
}
