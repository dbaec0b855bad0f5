//! 見積書の抽出

use crate::grid::{zip_row, Grid};
use crate::types::{Estimate, EstimateItem, Record};

/// 見積書として分類されたグリッドから`Estimate`を生成する
///
/// データ行ごとに1つの明細を作り、`total`は各明細の`Total`の合計
/// （算出できなかった明細は0として扱う）。データ行がなくてもエラーにはならない。
pub fn extract_estimate(grid: &Grid, sheet_name: &str) -> Estimate {
    let headers = grid.headers();

    let items: Vec<EstimateItem> = grid
        .data_rows()
        .iter()
        .map(|row| {
            let fields = zip_row(headers, row);
            let total = item_total(&fields);
            EstimateItem { fields, total }
        })
        .collect();

    let total = items
        .iter()
        .filter_map(|item| item.total)
        .fold(0.0, |acc, t| acc + t);

    Estimate {
        sheet_name: sheet_name.to_string(),
        title: format!("{} - Project Estimate", sheet_name),
        headers: grid.header_names(),
        items,
        total,
    }
}

/// 明細の金額を算出する
///
/// 1. `Quantity`と`Rate`が数値なら`Quantity * Rate`
/// 2. そうでなく`Hours`と`Rate`が数値なら`Hours * Rate`
/// 3. どちらも算出できず、行自身の`Total`が数値ならその値
/// 4. いずれでもなければ`None`
pub fn item_total(fields: &Record) -> Option<f64> {
    computed_total(fields).or_else(|| fields.number("Total"))
}

fn computed_total(fields: &Record) -> Option<f64> {
    let rate = fields.number("Rate")?;
    fields
        .number("Quantity")
        .or_else(|| fields.number("Hours"))
        .map(|units| units * rate)
        .filter(|total| total.is_finite())
}
