use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReconError;
use crate::key::{recon_key, UNMAPPED_KEY};
use crate::model::{EnrichedRecord, OutputRow, ReconMeta, ReconReport, ReconSummary};

/// Group enriched records by reconciliation key and classify each mapped
/// group, producing interleaved summary/detail rows.
///
/// Groups iterate in sorted-key order and members keep original input
/// order, so output is fully deterministic for a given input. Every
/// input record appears in exactly one detail row; only mapped groups
/// additionally get a summary row.
pub fn reconcile(enriched: &[EnrichedRecord]) -> Result<ReconReport, ReconError> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedRecord>> = BTreeMap::new();
    for record in enriched {
        groups.entry(recon_key(record)).or_default().push(record);
    }

    let mut rows: Vec<OutputRow> = Vec::new();
    let mut summary = ReconSummary {
        groups: 0,
        matched: 0,
        mismatched: 0,
        unmapped_records: 0,
    };

    for (key, members) in &groups {
        if *key == UNMAPPED_KEY {
            // No summary row: there is nothing meaningful to aggregate
            // across unrelated unresolved securities.
            summary.unmapped_records += members.len();
            for member in members {
                rows.push(unmapped_detail_row(member));
            }
            continue;
        }

        let status = match_status(members);
        summary.groups += 1;
        if status == "Matched" {
            summary.matched += 1;
        } else {
            summary.mismatched += 1;
        }

        rows.push(summary_row(key, members, &status)?);
        for member in members {
            rows.push(mapped_detail_row(member));
        }
    }

    Ok(ReconReport {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        rows,
    })
}

/// Verdict for one mapped group.
///
/// Quantities are compared as reported strings: if every member reports
/// the same string the group is "Matched"; otherwise every unordered
/// member pair that differs contributes a `"A(qa) vs B(qb)"` diff.
/// Duplicate same-source members are compared like any other pair; the
/// source label in the diff makes a same-source conflict visible.
fn match_status(members: &[&EnrichedRecord]) -> String {
    let distinct: BTreeSet<&str> = members.iter().map(|m| m.quantity.as_str()).collect();
    if distinct.len() == 1 {
        return "Matched".into();
    }

    let mut diffs = Vec::new();
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            if a.quantity != b.quantity {
                diffs.push(format!(
                    "{}({}) vs {}({})",
                    a.source, a.quantity, b.source, b.quantity
                ));
            }
        }
    }

    if diffs.is_empty() {
        "Mismatch".into()
    } else {
        diffs.join("; ")
    }
}

/// Sum of member quantities, parsed as decimals. A parse failure is
/// fatal for the run, never coerced to zero.
fn total_quantity(members: &[&EnrichedRecord]) -> Result<f64, ReconError> {
    members.iter().try_fold(0.0_f64, |acc, m| {
        m.quantity
            .trim()
            .parse::<f64>()
            .map(|q| acc + q)
            .map_err(|_| ReconError::QuantityParse {
                source: m.source.to_string(),
                security_id: m.security_id.clone(),
                value: m.quantity.clone(),
            })
    })
}

fn summary_row(
    key: &str,
    members: &[&EnrichedRecord],
    status: &str,
) -> Result<OutputRow, ReconError> {
    // "First" is well-defined: members are in original input order.
    let first = members[0];
    let security_name = first
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| first.security_name.clone());

    Ok(OutputRow {
        recon_key: key.to_string(),
        security_name,
        market_sector: first.market_sector.clone().unwrap_or_default(),
        currency: first.currency.clone().unwrap_or_default(),
        security_type: first.security_type.clone().unwrap_or_default(),
        total_quantity: total_quantity(members)?.to_string(),
        match_status: status.to_string(),
        source: "SUMMARY".into(),
        ..OutputRow::blank()
    })
}

fn mapped_detail_row(member: &EnrichedRecord) -> OutputRow {
    OutputRow {
        // Key cell left blank; the group key is on the summary row above.
        security_name: member.name.clone().unwrap_or_default(),
        market_sector: member.market_sector.clone().unwrap_or_default(),
        currency: member.currency.clone().unwrap_or_default(),
        security_type: member.security_type.clone().unwrap_or_default(),
        source: member.source.to_string(),
        security_id: member.security_id.clone(),
        id_type: member.id_type.clone(),
        quantity: member.quantity.clone(),
        price: member.price.clone(),
        figi: member.figi.clone().unwrap_or_default(),
        exch_code: member.exch_code.clone().unwrap_or_default(),
        share_class_figi: member.share_class_figi.clone().unwrap_or_default(),
        status: member.status.clone().unwrap_or_default(),
        request: member.request.clone(),
        response: member.response.clone(),
        ..OutputRow::blank()
    }
}

fn unmapped_detail_row(member: &EnrichedRecord) -> OutputRow {
    // Self-reported fields only; no service-provided fields exist.
    OutputRow {
        recon_key: UNMAPPED_KEY.into(),
        security_name: member.security_name.clone(),
        source: member.source.to_string(),
        security_id: member.security_id.clone(),
        id_type: member.id_type.clone(),
        quantity: member.quantity.clone(),
        price: member.price.clone(),
        request: member.request.clone(),
        response: member.response.clone(),
        ..OutputRow::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    fn enriched(source: Source, id: &str, qty: &str, figi: Option<&str>) -> EnrichedRecord {
        EnrichedRecord {
            source,
            security_id: id.into(),
            id_type: "ISIN".into(),
            quantity: qty.into(),
            price: "10.00".into(),
            security_name: format!("{id} self-reported"),
            figi: figi.map(String::from),
            composite_figi: figi.map(String::from),
            security_type: figi.map(|_| "Common Stock".into()),
            security_type2: None,
            market_sector: figi.map(|_| "Equity".into()),
            exch_code: figi.map(|_| "US".into()),
            share_class_figi: None,
            currency: figi.map(|_| "USD".into()),
            status: None,
            expiration: None,
            coupon: None,
            maturity: None,
            ticker: None,
            name: figi.map(|f| format!("{f} CO")),
            request: "{\"idType\":\"ID_ISIN\"}".into(),
            response: "{}".into(),
        }
    }

    #[test]
    fn unanimous_quantities_match() {
        let records = vec![
            enriched(Source::FundAdmin, "A", "100", Some("BBG01")),
            enriched(Source::Custodian, "A", "100", Some("BBG01")),
            enriched(Source::ExternalManager, "A", "100", Some("BBG01")),
        ];
        let report = reconcile(&records).unwrap();

        assert_eq!(report.summary.groups, 1);
        assert_eq!(report.summary.matched, 1);
        assert_eq!(report.summary.mismatched, 0);

        // Summary row first, then one detail row per member.
        assert_eq!(report.rows.len(), 4);
        let summary = &report.rows[0];
        assert_eq!(summary.recon_key, "BBG01");
        assert_eq!(summary.match_status, "Matched");
        assert_eq!(summary.total_quantity, "300");
        assert_eq!(summary.source, "SUMMARY");
        assert_eq!(report.rows[1].source, "FundAdmin");
        assert_eq!(report.rows[1].recon_key, "");
    }

    #[test]
    fn pairwise_diff_string() {
        let records = vec![
            enriched(Source::FundAdmin, "A", "100", Some("BBG01")),
            enriched(Source::Custodian, "A", "90", Some("BBG01")),
        ];
        let report = reconcile(&records).unwrap();
        assert_eq!(report.rows[0].match_status, "FundAdmin(100) vs Custodian(90)");
        assert_eq!(report.summary.mismatched, 1);
    }

    #[test]
    fn three_way_mismatch_joins_diffs() {
        let records = vec![
            enriched(Source::FundAdmin, "A", "100", Some("BBG01")),
            enriched(Source::Custodian, "A", "90", Some("BBG01")),
            enriched(Source::ExternalManager, "A", "100", Some("BBG01")),
        ];
        let report = reconcile(&records).unwrap();
        assert_eq!(
            report.rows[0].match_status,
            "FundAdmin(100) vs Custodian(90); Custodian(90) vs ExternalManager(100)"
        );
    }

    #[test]
    fn same_source_duplicates_surface_in_diffs() {
        let records = vec![
            enriched(Source::Custodian, "A", "100", Some("BBG01")),
            enriched(Source::Custodian, "A", "90", Some("BBG01")),
        ];
        let report = reconcile(&records).unwrap();
        assert_eq!(report.rows[0].match_status, "Custodian(100) vs Custodian(90)");
        // Both duplicates keep their own detail row.
        assert_eq!(report.rows.len(), 3);
    }

    #[test]
    fn quantities_compared_as_reported_strings() {
        // "100" vs "100.0" is a reporting difference, not a match.
        let records = vec![
            enriched(Source::FundAdmin, "A", "100", Some("BBG01")),
            enriched(Source::Custodian, "A", "100.0", Some("BBG01")),
        ];
        let report = reconcile(&records).unwrap();
        assert_eq!(report.rows[0].match_status, "FundAdmin(100) vs Custodian(100.0)");
        // The total still sums numerically.
        assert_eq!(report.rows[0].total_quantity, "200");
    }

    #[test]
    fn unmapped_records_share_the_sentinel_group() {
        let records = vec![
            enriched(Source::FundAdmin, "GOOD", "10", Some("BBG01")),
            enriched(Source::Custodian, "BAD1", "5", None),
            enriched(Source::ExternalManager, "BAD2", "7", None),
        ];
        let report = reconcile(&records).unwrap();

        assert_eq!(report.summary.groups, 1);
        assert_eq!(report.summary.unmapped_records, 2);

        let sentinel_rows: Vec<_> = report
            .rows
            .iter()
            .filter(|r| r.recon_key == UNMAPPED_KEY)
            .collect();
        assert_eq!(sentinel_rows.len(), 2);
        // No summary row for the sentinel group.
        assert!(sentinel_rows.iter().all(|r| r.source != "SUMMARY"));
        // Self-reported fields only, service fields blank, provenance kept.
        assert_eq!(sentinel_rows[0].security_name, "BAD1 self-reported");
        assert_eq!(sentinel_rows[0].figi, "");
        assert_eq!(sentinel_rows[0].currency, "");
        assert!(!sentinel_rows[0].request.is_empty());
    }

    #[test]
    fn every_record_gets_exactly_one_detail_row() {
        let records = vec![
            enriched(Source::FundAdmin, "A", "1", Some("BBG02")),
            enriched(Source::Custodian, "A", "1", Some("BBG02")),
            enriched(Source::FundAdmin, "B", "2", Some("BBG01")),
            enriched(Source::Custodian, "C", "3", None),
        ];
        let report = reconcile(&records).unwrap();

        let detail_count = report.rows.iter().filter(|r| r.source != "SUMMARY").count();
        assert_eq!(detail_count, records.len());

        let known = ["FundAdmin", "Custodian", "ExternalManager", "SUMMARY"];
        assert!(report.rows.iter().all(|r| known.contains(&r.source.as_str())));
    }

    #[test]
    fn groups_emit_in_sorted_key_order() {
        let records = vec![
            enriched(Source::FundAdmin, "Z", "1", Some("BBG_ZZ")),
            enriched(Source::FundAdmin, "A", "1", Some("BBG_AA")),
        ];
        let report = reconcile(&records).unwrap();
        assert_eq!(report.rows[0].recon_key, "BBG_AA");
        assert_eq!(report.rows[2].recon_key, "BBG_ZZ");
    }

    #[test]
    fn summary_fields_come_from_first_member_in_input_order() {
        let mut second = enriched(Source::Custodian, "A", "100", Some("BBG01"));
        second.name = Some("OTHER NAME".into());
        second.market_sector = Some("Govt".into());
        let records = vec![enriched(Source::FundAdmin, "A", "100", Some("BBG01")), second];

        let report = reconcile(&records).unwrap();
        assert_eq!(report.rows[0].security_name, "BBG01 CO");
        assert_eq!(report.rows[0].market_sector, "Equity");
    }

    #[test]
    fn summary_name_falls_back_to_self_reported() {
        let mut rec = enriched(Source::FundAdmin, "A", "100", Some("BBG01"));
        rec.name = Some("   ".into());
        let report = reconcile(&[rec]).unwrap();
        assert_eq!(report.rows[0].security_name, "A self-reported");
    }

    #[test]
    fn unparseable_quantity_in_mapped_group_is_fatal() {
        let records = vec![enriched(Source::FundAdmin, "A", "N/A", Some("BBG01"))];
        let err = reconcile(&records).unwrap_err();
        match err {
            ReconError::QuantityParse { source, security_id, value } => {
                assert_eq!(source, "FundAdmin");
                assert_eq!(security_id, "A");
                assert_eq!(value, "N/A");
            }
            other => panic!("expected QuantityParse, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_quantity_in_sentinel_group_is_tolerated() {
        // No summary row means no total to compute.
        let records = vec![enriched(Source::FundAdmin, "A", "N/A", None)];
        let report = reconcile(&records).unwrap();
        assert_eq!(report.summary.unmapped_records, 1);
    }

    #[test]
    fn reconcile_is_idempotent_modulo_timestamp() {
        let records = vec![
            enriched(Source::FundAdmin, "A", "100", Some("BBG01")),
            enriched(Source::Custodian, "A", "90", Some("BBG01")),
            enriched(Source::ExternalManager, "B", "5", None),
        ];
        let first = reconcile(&records).unwrap();
        let second = reconcile(&records).unwrap();
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn fractional_totals_sum_exactly() {
        let records = vec![
            enriched(Source::FundAdmin, "A", "100.5", Some("BBG01")),
            enriched(Source::Custodian, "A", "100.5", Some("BBG01")),
        ];
        let report = reconcile(&records).unwrap();
        assert_eq!(report.rows[0].match_status, "Matched");
        assert_eq!(report.rows[0].total_quantity, "201");
    }
}
