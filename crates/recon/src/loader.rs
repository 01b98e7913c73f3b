use crate::error::ReconError;
use crate::model::{PositionRecord, Source};

/// Load one source's position feed from CSV text.
///
/// Required columns: SecurityID, IDType, Quantity, Price, SecurityName.
/// Extra columns are ignored. Values are kept as reported strings;
/// numeric parsing is deferred to aggregation.
pub fn load_positions(csv_data: &str, source: Source) -> Result<Vec<PositionRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            source: source.to_string(),
            column: name.into(),
        })
    };

    let security_id_idx = idx("SecurityID")?;
    let id_type_idx = idx("IDType")?;
    let quantity_idx = idx("Quantity")?;
    let price_idx = idx("Price")?;
    let security_name_idx = idx("SecurityName")?;

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;

        rows.push(PositionRecord {
            source,
            security_id: record.get(security_id_idx).unwrap_or("").to_string(),
            id_type: record.get(id_type_idx).unwrap_or("").to_string(),
            quantity: record.get(quantity_idx).unwrap_or("").to_string(),
            price: record.get(price_idx).unwrap_or("").to_string(),
            security_name: record.get(security_name_idx).unwrap_or("").to_string(),
        });
    }

    Ok(rows)
}
