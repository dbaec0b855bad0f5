//! Classifier Module
//!
//! シート全体のテキストに含まれるキーワードから、見積書・財務諸表・未分類を判定する。
//! 規則は上から順に評価され、最初に一致した規則の分類が採用されます。

use crate::api::SheetKind;
use crate::grid::Grid;

/// 分類規則（評価順）
const RULES: &[(SheetKind, &[&str])] = &[
    (SheetKind::Estimate, &["estimate", "project", "hours", "rate"]),
    (
        SheetKind::FinancialStatement,
        &["income", "balance", "revenue", "expense"],
    ),
];

/// グリッドを分類する
pub fn classify(grid: &Grid) -> SheetKind {
    classify_blob(&grid.blob())
}

/// 小文字化済みのテキストを分類する
///
/// どの規則にも一致しない場合は`SheetKind::Unclassified`。
pub fn classify_blob(blob: &str) -> SheetKind {
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| blob.contains(kw)))
        .map(|(kind, _)| *kind)
        .unwrap_or(SheetKind::Unclassified)
}
