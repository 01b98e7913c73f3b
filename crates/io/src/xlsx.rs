// XLSX report export.
//
// Two sheets per run: the raw source-tagged records as loaded, and the
// reconciliation result with interleaved summary/detail rows.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use posrecon_recon::{OutputRow, PositionRecord, ReconReport};

/// Pre-mapping sheet: every record exactly as loaded, tagged by source.
const BEFORE_SHEET: &str = "Before_FIGI_Mapping";
const BEFORE_HEADERS: [&str; 6] = [
    "Source",
    "SecurityID",
    "IDType",
    "Quantity",
    "Price",
    "SecurityName",
];

/// Post-mapping sheet: one column per [`OutputRow`] field, same order.
const AFTER_SHEET: &str = "After_FIGI_Mapping";
const AFTER_HEADERS: [&str; 18] = [
    "CompositeFIGI/FIGI",
    "SecurityName",
    "MarketSector",
    "Currency",
    "SecurityType",
    "TotalQuantity",
    "MatchStatus",
    "Source",
    "SecurityID",
    "IDType",
    "Quantity",
    "Price",
    "FIGI",
    "ExchCode",
    "ShareClassFIGI",
    "Status",
    "MappingRequest",
    "MappingResponse",
];

/// Default report filename, timestamped to the second in local time.
pub fn default_output_path() -> String {
    chrono::Local::now()
        .format("reconoutput_%Y%m%d_%H%M%S.xlsx")
        .to_string()
}

/// Write the two-sheet reconciliation workbook.
///
/// `records` fills the pre-mapping sheet in input order; `report.rows`
/// fill the result sheet in engine order. When `records` is empty the
/// pre-mapping sheet still gets its header row, so the workbook shape is
/// stable across runs.
pub fn write_report(
    path: &Path,
    records: &[PositionRecord],
    report: Option<&ReconReport>,
) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let before = workbook
        .add_worksheet()
        .set_name(BEFORE_SHEET)
        .map_err(|e| format!("Failed to create sheet '{BEFORE_SHEET}': {e}"))?;
    write_before_sheet(before, records, &header_format)?;

    if let Some(report) = report {
        let after = workbook
            .add_worksheet()
            .set_name(AFTER_SHEET)
            .map_err(|e| format!("Failed to create sheet '{AFTER_SHEET}': {e}"))?;
        write_after_sheet(after, &report.rows, &header_format)?;
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {e}"))?;

    Ok(())
}

fn write_before_sheet(
    worksheet: &mut Worksheet,
    records: &[PositionRecord],
    header_format: &Format,
) -> Result<(), String> {
    write_headers(worksheet, &BEFORE_HEADERS, header_format)?;

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        write_text(worksheet, row, 0, record.source.as_str())?;
        write_text(worksheet, row, 1, &record.security_id)?;
        write_text(worksheet, row, 2, &record.id_type)?;
        write_maybe_number(worksheet, row, 3, &record.quantity)?;
        write_maybe_number(worksheet, row, 4, &record.price)?;
        write_text(worksheet, row, 5, &record.security_name)?;
    }

    Ok(())
}

fn write_after_sheet(
    worksheet: &mut Worksheet,
    rows: &[OutputRow],
    header_format: &Format,
) -> Result<(), String> {
    write_headers(worksheet, &AFTER_HEADERS, header_format)?;

    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        write_text(worksheet, row, 0, &r.recon_key)?;
        write_text(worksheet, row, 1, &r.security_name)?;
        write_text(worksheet, row, 2, &r.market_sector)?;
        write_text(worksheet, row, 3, &r.currency)?;
        write_text(worksheet, row, 4, &r.security_type)?;
        write_maybe_number(worksheet, row, 5, &r.total_quantity)?;
        write_text(worksheet, row, 6, &r.match_status)?;
        write_text(worksheet, row, 7, &r.source)?;
        write_text(worksheet, row, 8, &r.security_id)?;
        write_text(worksheet, row, 9, &r.id_type)?;
        write_maybe_number(worksheet, row, 10, &r.quantity)?;
        write_maybe_number(worksheet, row, 11, &r.price)?;
        write_text(worksheet, row, 12, &r.figi)?;
        write_text(worksheet, row, 13, &r.exch_code)?;
        write_text(worksheet, row, 14, &r.share_class_figi)?;
        write_text(worksheet, row, 15, &r.status)?;
        write_text(worksheet, row, 16, &r.request)?;
        write_text(worksheet, row, 17, &r.response)?;
    }

    Ok(())
}

fn write_headers(
    worksheet: &mut Worksheet,
    headers: &[&str],
    format: &Format,
) -> Result<(), String> {
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, format)
            .map_err(|e| format!("Failed to write header '{header}': {e}"))?;
    }
    Ok(())
}

fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<(), String> {
    worksheet
        .write_string(row, col, value)
        .map_err(|e| format!("Failed to write cell ({row}, {col}): {e}"))?;
    Ok(())
}

/// Write a typed number when the reported string parses as a decimal,
/// otherwise fall back to the reported text. Blank cells stay blank text.
fn write_maybe_number(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &str,
) -> Result<(), String> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => worksheet
            .write_number(row, col, n)
            .map_err(|e| format!("Failed to write cell ({row}, {col}): {e}"))?,
        _ => {
            worksheet
                .write_string(row, col, value)
                .map_err(|e| format!("Failed to write cell ({row}, {col}): {e}"))?
        }
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use posrecon_recon::model::{ReconMeta, ReconSummary, Source};
    use posrecon_recon::reconcile;

    fn record(id: &str, qty: &str) -> PositionRecord {
        PositionRecord {
            source: Source::FundAdmin,
            security_id: id.into(),
            id_type: "ISIN".into(),
            quantity: qty.into(),
            price: "10.5".into(),
            security_name: format!("{id} Inc"),
        }
    }

    fn empty_report() -> ReconReport {
        ReconReport {
            meta: ReconMeta {
                engine_version: "test".into(),
                run_at: "2026-01-01T00:00:00Z".into(),
            },
            summary: ReconSummary {
                groups: 0,
                matched: 0,
                mismatched: 0,
                unmapped_records: 0,
            },
            rows: Vec::new(),
        }
    }

    #[test]
    fn writes_two_sheet_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let records = vec![record("US0378331005", "100"), record("WDGT", "not-a-number")];
        write_report(&path, &records, Some(&empty_report())).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn skip_mapping_omits_result_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premap.xlsx");

        write_report(&path, &[record("X", "1")], None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_input_still_produces_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        write_report(&path, &[], Some(&empty_report())).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn report_rows_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.xlsx");

        // Run a real reconciliation through the engine so row shapes match
        // what production writes.
        let enriched: Vec<posrecon_recon::EnrichedRecord> = Vec::new();
        let report = reconcile(&enriched).unwrap();
        write_report(&path, &[record("A", "5")], Some(&report)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let path = Path::new("/nonexistent-dir/out.xlsx");
        let err = write_report(path, &[], None).unwrap_err();
        assert!(err.contains("Failed to save"));
    }

    #[test]
    fn default_output_path_shape() {
        let name = default_output_path();
        assert!(name.starts_with("reconoutput_"));
        assert!(name.ends_with(".xlsx"));
        // reconoutput_YYYYMMDD_HHMMSS.xlsx
        assert_eq!(name.len(), "reconoutput_20260101_120000.xlsx".len());
    }
}
