#![cfg(feature = "history")]

use chrono::{NaiveDate, NaiveDateTime};
use intrinsic_value_core::history::{
    export_to_path, CsvHistoryLog, HistoryLog, HistoryRecord, MemoryHistoryLog, EXPORT_SHEET_NAME,
};
use intrinsic_value_core::orchestrator::{
    value_company, FinancialModel, Valuation, ValuationRequest,
};
use intrinsic_value_core::rates::CostOfEquityInput;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn gordon(company: &str, d1: rust_decimal::Decimal) -> ValuationRequest {
    ValuationRequest {
        company: company.into(),
        valuation: Valuation::Financial {
            cost_of_equity: CostOfEquityInput::Direct { ke_pct: dec!(12) },
            capital_structure: None,
            model: FinancialModel::GordonGrowth { d1, g_pct: dec!(5) },
        },
    }
}

#[test]
fn test_record_from_result_rounds_and_labels() {
    let result = value_company(&gordon("Acme Bank", dec!(10))).unwrap();
    let record = HistoryRecord::from_result(&result.company, &result, at(14, 5, 59));

    assert_eq!(record.company, "Acme Bank");
    assert_eq!(record.intrinsic_value_per_share, dec!(142.8571));
    assert_eq!(record.intrinsic_value_per_share.scale(), 4);
    assert_eq!(record.model, "Financials - Gordon Growth DDM");
    assert_eq!(record.timestamp, at(14, 5, 0));
}

#[test]
fn test_csv_log_appends_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("valuation_history.csv");
    let mut log = CsvHistoryLog::new(&path);

    for (i, company) in ["First", "Second", "Third"].iter().enumerate() {
        let result = value_company(&gordon(company, dec!(10) + rust_decimal::Decimal::from(i))).unwrap();
        log.append(HistoryRecord::from_result(company, &result, at(9, i as u32, 0)))
            .unwrap();
    }

    let records = log.records().unwrap();
    let companies: Vec<&str> = records.iter().map(|r| r.company.as_str()).collect();
    assert_eq!(companies, vec!["First", "Second", "Third"]);
    assert_eq!(records[1].intrinsic_value_per_share, dec!(157.1429));

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Company,IV per Share,Model,Date"));
    assert_eq!(
        lines.next(),
        Some("First,142.8571,Financials - Gordon Growth DDM,2024-06-30 09:00")
    );
    // Header is written once only
    assert_eq!(text.matches("Company,IV per Share").count(), 1);
}

#[test]
fn test_csv_log_reopened_keeps_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let result = value_company(&gordon("Acme", dec!(10))).unwrap();

    CsvHistoryLog::new(&path)
        .append(HistoryRecord::from_result("Acme", &result, at(10, 0, 0)))
        .unwrap();
    let mut reopened = CsvHistoryLog::new(&path);
    reopened
        .append(HistoryRecord::from_result("Acme", &result, at(11, 0, 0)))
        .unwrap();

    let records = reopened.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].timestamp, at(10, 0, 0));
    assert_eq!(records[1].timestamp, at(11, 0, 0));
}

#[test]
fn test_memory_and_csv_logs_agree() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv_log = CsvHistoryLog::new(dir.path().join("log.csv"));
    let mut memory_log = MemoryHistoryLog::new();

    let result = value_company(&gordon("Bank", dec!(3.5))).unwrap();
    let record = HistoryRecord::from_result("Bank", &result, at(8, 15, 0));
    csv_log.append(record.clone()).unwrap();
    memory_log.append(record).unwrap();

    assert_eq!(csv_log.records().unwrap(), memory_log.records().unwrap());
}

#[test]
fn test_export_preserves_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = CsvHistoryLog::new(dir.path().join("log.csv"));
    for company in ["B", "A", "C"] {
        let result = value_company(&gordon(company, dec!(10))).unwrap();
        log.append(HistoryRecord::from_result(company, &result, at(12, 0, 0)))
            .unwrap();
    }

    let target = export_to_path(&log.records().unwrap(), dir.path()).unwrap();
    assert_eq!(target, dir.path().join(format!("{EXPORT_SHEET_NAME}.csv")));

    let exported = std::fs::read_to_string(&target).unwrap();
    let original = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(exported, original);
}
