//! 財務諸表の抽出

use crate::grid::{zip_row, Grid};
use crate::types::{CellValue, FinancialSection, FinancialStatement};

/// 財務諸表として分類されたグリッドから`FinancialStatement`を生成する
///
/// データ行を順に走査し、先頭セルだけを見てセクションの開始を判定する。
/// 最初のセクションより前の行は捨てられる。
pub fn extract_financial_statement(grid: &Grid, sheet_name: &str) -> FinancialStatement {
    let headers = grid.headers();
    let mut sections = Vec::new();
    let mut current: Option<FinancialSection> = None;

    for row in grid.data_rows() {
        let first = row.first().unwrap_or(&CellValue::Empty);

        if is_section_header(first) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(FinancialSection {
                name: first.as_raw_string(),
                items: Vec::new(),
            });
        } else if let Some(section) = current.as_mut() {
            section.items.push(zip_row(headers, row));
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    FinancialStatement {
        sheet_name: sheet_name.to_string(),
        title: format!("{} - Financial Statement", sheet_name),
        sections,
    }
}

/// セクション見出しかどうか
///
/// 空でない文字列で、すでにすべて大文字であるか`:`を含むもの。
pub fn is_section_header(cell: &CellValue) -> bool {
    match cell.as_str() {
        Some(text) if !text.is_empty() => text.to_uppercase() == text || text.contains(':'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn headers() -> Vec<CellValue> {
        vec![s("Item"), s("Amount")]
    }

    #[test]
    fn test_is_section_header() {
        assert!(is_section_header(&s("REVENUE")));
        assert!(is_section_header(&s("Operating costs:")));
        assert!(!is_section_header(&s("Consulting fees")));
        assert!(!is_section_header(&s("")));
        assert!(!is_section_header(&n(100.0)));
        assert!(!is_section_header(&CellValue::Empty));
    }

    #[test]
    fn test_sections_preserve_order() {
        let grid = Grid::from_rows(vec![
            headers(),
            vec![s("REVENUE")],
            vec![s("Sales"), n(100.0)],
            vec![s("Fees"), n(20.0)],
            vec![s("Costs:")],
            vec![s("Rent"), n(50.0)],
        ]);

        let statement = extract_financial_statement(&grid, "P&L");

        assert_eq!(statement.title, "P&L - Financial Statement");
        assert_eq!(statement.sections.len(), 2);
        assert_eq!(statement.sections[0].name, "REVENUE");
        assert_eq!(statement.sections[0].items.len(), 2);
        assert_eq!(statement.sections[0].items[0].get("Item"), Some(&s("Sales")));
        assert_eq!(statement.sections[0].items[1].get("Item"), Some(&s("Fees")));
        assert_eq!(statement.sections[1].name, "Costs:");
        assert_eq!(statement.sections[1].items.len(), 1);
        assert_eq!(statement.sections[1].items[0].number("Amount"), Some(50.0));
    }

    #[test]
    fn test_rows_before_first_section_are_dropped() {
        let grid = Grid::from_rows(vec![
            headers(),
            vec![s("Opening note"), n(1.0)],
            vec![s("INCOME")],
            vec![s("Sales"), n(10.0)],
        ]);

        let statement = extract_financial_statement(&grid, "Sheet");

        assert_eq!(statement.sections.len(), 1);
        assert_eq!(statement.sections[0].items.len(), 1);
        assert_eq!(statement.sections[0].items[0].get("Item"), Some(&s("Sales")));
    }

    #[test]
    fn test_empty_and_numeric_first_cells_are_items() {
        let grid = Grid::from_rows(vec![
            headers(),
            vec![s("EXPENSES")],
            vec![CellValue::Empty, n(5.0)],
            vec![n(2024.0), n(7.0)],
            vec![],
        ]);

        let statement = extract_financial_statement(&grid, "Sheet");
        assert_eq!(statement.sections[0].items.len(), 3);
    }

    #[test]
    fn test_consecutive_headers_create_empty_sections() {
        let grid = Grid::from_rows(vec![
            headers(),
            vec![s("TOTAL REVENUE"), n(70.0)],
            vec![s("NET INCOME"), n(37.0)],
        ]);

        let statement = extract_financial_statement(&grid, "Sheet");

        let names: Vec<&str> = statement.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["TOTAL REVENUE", "NET INCOME"]);
        assert!(statement.sections.iter().all(|s| s.items.is_empty()));
    }

    #[test]
    fn test_empty_grid() {
        let statement = extract_financial_statement(&Grid::default(), "Empty");
        assert!(statement.sections.is_empty());
    }
}
