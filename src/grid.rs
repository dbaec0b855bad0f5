//! Grid Module
//!
//! ワークシート1枚分のセル値を行の並びとして保持するモジュール。
//! 行0をヘッダー行、行1以降をデータ行として扱い、行ごとの長さの違い（ragged）を許容します。

use crate::types::{CellValue, Record};

/// 論理的なグリッド構造
///
/// 各行は末尾の空セルを持たない可変長の配列です。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    /// グリッドデータ（行 × 列）
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// 行データからグリッドを構築する
    ///
    /// 各行の末尾にある空セルは取り除かれます（行そのものは空でも保持されます）。
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                while matches!(row.last(), Some(CellValue::Empty)) {
                    row.pop();
                }
                row
            })
            .collect();
        Self { rows }
    }

    /// 行数（ヘッダー行を含む）
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 行が1つも存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// ヘッダー行（行0）。存在しない場合は空スライス
    pub fn headers(&self) -> &[CellValue] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// データ行（行1以降）
    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// すべての行
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// ヘッダー名の一覧（空のヘッダーセルは除外）
    pub fn header_names(&self) -> Vec<String> {
        self.headers()
            .iter()
            .filter(|h| !h.is_empty())
            .map(CellValue::as_raw_string)
            .collect()
    }

    /// 分類用のテキスト（空でないセルの文字列表現を小文字化して連結したもの）
    ///
    /// 空セルは読み飛ばし、セルの後ろにはタブ、行の終わりには改行を付けます。
    /// 空行も改行1つとして現れるため、空セルだけのグリッドは改行のみになります。
    /// 区切り文字があるので、キーワードがセル境界をまたいで一致することはありません。
    pub fn blob(&self) -> String {
        let mut blob = String::new();
        for row in &self.rows {
            for cell in row {
                if cell.is_empty() {
                    continue;
                }
                blob.push_str(&cell.as_raw_string().to_lowercase());
                blob.push('\t');
            }
            blob.push('\n');
        }
        blob
    }

    /// データ行をヘッダーに対応付けたレコードの一覧
    pub fn records(&self) -> Vec<Record> {
        let headers = self.headers();
        self.data_rows()
            .iter()
            .map(|row| zip_row(headers, row))
            .collect()
    }
}

/// ヘッダーと行を位置で対応付けてレコードを生成する
///
/// * ヘッダー`i`は行の`i`番目のセルに対応する
/// * 行がヘッダーより短い場合、不足分は空セルとして扱う
/// * ヘッダーより長い行の余剰セルは捨てられる
/// * 空のヘッダーセルに対応する列は出力しない
pub fn zip_row(headers: &[CellValue], row: &[CellValue]) -> Record {
    let mut record = Record::new();
    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let value = row.get(index).cloned().unwrap_or(CellValue::Empty);
        record.insert(header.as_raw_string(), value);
    }
    record
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

    #[test]
    fn test_from_rows_trims_trailing_empty_cells() {
        let grid = Grid::from_rows(vec![
            vec![s("A"), s("B"), CellValue::Empty],
            vec![CellValue::Empty, CellValue::Empty],
        ]);

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.headers().len(), 2);
        assert!(grid.data_rows()[0].is_empty());
    }

    #[test]
    fn test_empty_grid() {
        let grid = Grid::default();
        assert!(grid.is_empty());
        assert!(grid.headers().is_empty());
        assert!(grid.data_rows().is_empty());
        assert!(grid.records().is_empty());
    }

    #[test]
    fn test_header_only_grid_has_no_data_rows() {
        let grid = Grid::from_rows(vec![vec![s("Description"), s("Hours")]]);
        assert!(grid.data_rows().is_empty());
        assert_eq!(grid.header_names(), vec!["Description", "Hours"]);
    }

    #[test]
    fn test_zip_row_short_row() {
        let headers = vec![s("Description"), s("Hours"), s("Rate")];
        let record = zip_row(&headers, &[s("Review"), n(10.0)]);

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("Rate"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_zip_row_long_row() {
        let headers = vec![s("Description")];
        let record = zip_row(&headers, &[s("Design"), n(10.0), n(50.0)]);

        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Description"), Some(&s("Design")));
    }

    #[test]
    fn test_zip_row_skips_empty_headers_and_stringifies_numbers() {
        let headers = vec![s("Item"), CellValue::Empty, n(2024.0)];
        let record = zip_row(&headers, &[s("Rent"), s("ignored"), n(1200.0)]);

        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Item", "2024"]);
        assert_eq!(record.number("2024"), Some(1200.0));
    }

    #[test]
    fn test_blob_is_lowercase_and_cell_separated() {
        let grid = Grid::from_rows(vec![vec![s("Project"), s("RA")], vec![s("TE"), n(5.0)]]);
        let blob = grid.blob();

        assert!(blob.contains("project"));
        assert!(blob.contains('5'));
        assert!(!blob.contains("rate"));
    }

    #[test]
    fn test_blob_skips_empty_cells() {
        let grid = Grid::from_rows(vec![
            vec![CellValue::Empty, s("Hours")],
            vec![],
        ]);

        assert_eq!(grid.blob(), "hours\t\n\n");
    }
}
