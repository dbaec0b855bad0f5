//! Property-based tests
//!
//! proptestで任意のグリッドを生成し、集計・分類・セクション分割の性質を検証します。

use proptest::prelude::*;
use xlsxfin::{
    classify, classify_blob, extract_estimate, extract_financial_statement, CellValue, Grid,
    ReportAggregator, SheetKind,
};

/// 見積書のデータ行に現れ得るセル
fn estimate_cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        (-1.0e6f64..1.0e6).prop_map(CellValue::Number),
        (0u32..10_000).prop_map(|n| CellValue::String(n.to_string())),
        "[a-zA-Z ]{0,8}".prop_map(CellValue::String),
        any::<bool>().prop_map(CellValue::Bool),
        Just(CellValue::Empty),
    ]
}

fn estimate_rows() -> impl Strategy<Value = Vec<Vec<CellValue>>> {
    prop::collection::vec(prop::collection::vec(estimate_cell(), 0..5), 0..40)
}

fn estimate_grid(rows: Vec<Vec<CellValue>>) -> Grid {
    let mut all = vec![vec![
        CellValue::String("Description".to_string()),
        CellValue::String("Quantity".to_string()),
        CellValue::String("Hours".to_string()),
        CellValue::String("Rate".to_string()),
    ]];
    all.extend(rows);
    Grid::from_rows(all)
}

/// 財務諸表の行（見出しか明細か）
#[derive(Debug, Clone)]
enum StatementRow {
    Header(String),
    Item(String),
}

fn statement_row() -> impl Strategy<Value = StatementRow> {
    prop_oneof![
        "[A-Z]{1,10}".prop_map(StatementRow::Header),
        "[a-z]{1,10}:".prop_map(StatementRow::Header),
        "[A-Z][a-z]{1,10}".prop_map(StatementRow::Item),
    ]
}

proptest! {
    #[test]
    fn estimate_total_is_sum_of_item_totals(rows in estimate_rows()) {
        let estimate = extract_estimate(&estimate_grid(rows.clone()), "Sheet");

        let expected: f64 = estimate
            .items
            .iter()
            .map(|item| item.total.unwrap_or(0.0))
            .sum();

        prop_assert!(!estimate.total.is_nan());
        prop_assert!((estimate.total - expected).abs() <= 1e-6 * expected.abs().max(1.0));
        prop_assert_eq!(estimate.items.len(), rows.len());
    }

    #[test]
    fn item_totals_are_finite(rows in estimate_rows()) {
        let estimate = extract_estimate(&estimate_grid(rows), "Sheet");
        for item in &estimate.items {
            if let Some(total) = item.total {
                prop_assert!(total.is_finite());
            }
        }
    }

    #[test]
    fn classification_is_deterministic(blob in "[a-z \t\n]{0,60}") {
        prop_assert_eq!(classify_blob(&blob), classify_blob(&blob));
    }

    #[test]
    fn estimate_keywords_take_precedence(
        prefix in "[a-z ]{0,10}",
        suffix in "[a-z ]{0,10}"
    ) {
        let blob = format!("{}revenue\t{}estimate", prefix, suffix);
        prop_assert_eq!(classify_blob(&blob), SheetKind::Estimate);
    }

    #[test]
    fn section_split_preserves_order(rows in prop::collection::vec(statement_row(), 0..30)) {
        let mut grid_rows = vec![vec![
            CellValue::String("Line".to_string()),
            CellValue::String("Amount".to_string()),
        ]];
        grid_rows.extend(rows.iter().map(|row| match row {
            StatementRow::Header(name) | StatementRow::Item(name) => {
                vec![CellValue::String(name.clone()), CellValue::Number(1.0)]
            }
        }));

        let statement = extract_financial_statement(&Grid::from_rows(grid_rows), "PL");

        // 期待値: 最初の見出しより前の明細を捨て、見出しごとに区切る
        let mut expected: Vec<(String, Vec<String>)> = Vec::new();
        for row in &rows {
            match row {
                StatementRow::Header(name) => expected.push((name.clone(), Vec::new())),
                StatementRow::Item(name) => {
                    if let Some((_, items)) = expected.last_mut() {
                        items.push(name.clone());
                    }
                }
            }
        }

        let actual: Vec<(String, Vec<String>)> = statement
            .sections
            .iter()
            .map(|section| {
                let items = section
                    .items
                    .iter()
                    .map(|item| item.get("Line").map(|v| v.as_raw_string()).unwrap_or_default())
                    .collect();
                (section.name.clone(), items)
            })
            .collect();

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn aggregator_counts_every_sheet(sheet_count in 0usize..8, rows in estimate_rows()) {
        let mut aggregator = ReportAggregator::default();
        let grid = estimate_grid(rows);
        let expected_kind = classify(&grid);

        for index in 0..sheet_count {
            let kind = aggregator.add_sheet(&format!("Sheet{}", index), &grid);
            prop_assert_eq!(kind, expected_kind);
        }
        let report = aggregator.finish();

        prop_assert_eq!(report.summary.total_sheets, sheet_count);
        prop_assert_eq!(report.summary.total_estimates, sheet_count);
        prop_assert_eq!(report.sheets.len(), sheet_count);

        let sum: f64 = report.estimates.iter().map(|e| e.total).sum();
        prop_assert!((report.summary.grand_total - sum).abs() <= 1e-6 * sum.abs().max(1.0));
    }
}
