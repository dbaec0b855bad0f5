//! Workbook Parser
//!
//! calamineのラッパーとして、ワークブックレベルの操作を提供します。
//! XLSX・XLSの両形式をバイト列から開き、シートを`Grid`へ変換します。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::io::{Cursor, Read, Seek};

use crate::api::SheetSelector;
use crate::error::XlsxFinError;
use crate::grid::Grid;
use crate::security::SecurityConfig;
use crate::types::CellValue;

/// ワークブックパーサー
pub struct WorkbookParser {
    /// calamineのワークブック（形式は自動判定）
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl WorkbookParser {
    /// リーダーからワークブックを開く
    ///
    /// # 引数
    ///
    /// * `reader` - Excelファイルを読み込むためのリーダー
    /// * `security` - 入力サイズの上限
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(XlsxFinError::SecurityViolation)` - サイズ上限を超えた場合
    /// * `Err(XlsxFinError::Parse)` - Excelファイルとして解析できない場合
    pub fn open<R: Read + Seek>(
        mut reader: R,
        security: &SecurityConfig,
    ) -> Result<Self, XlsxFinError> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;
        security.check_size(bytes_read as u64)?;
        Self::from_bytes(buffer)
    }

    /// バイト列からワークブックを開く（サイズ検証は呼び出し側で行う）
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, XlsxFinError> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        Ok(Self { workbook })
    }

    /// すべてのシート名を取得（ワークブック内の順序）
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト
    /// * `Err(XlsxFinError::SheetNotFound)` - シート名が見つからない場合
    /// * `Err(XlsxFinError::Config)` - インデックスが範囲外の場合
    pub fn select_sheets(&self, selector: &SheetSelector) -> Result<Vec<String>, XlsxFinError> {
        let all_sheet_names = self.sheet_names();

        let by_index = |index: usize| {
            all_sheet_names.get(index).cloned().ok_or_else(|| {
                XlsxFinError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    all_sheet_names.len()
                ))
            })
        };
        let by_name = |name: &String| {
            if all_sheet_names.contains(name) {
                Ok(name.clone())
            } else {
                Err(XlsxFinError::SheetNotFound(name.clone()))
            }
        };

        match selector {
            SheetSelector::All => Ok(all_sheet_names.clone()),
            SheetSelector::Index(index) => Ok(vec![by_index(*index)?]),
            SheetSelector::Name(name) => Ok(vec![by_name(name)?]),
            SheetSelector::Indices(indices) => indices.iter().map(|i| by_index(*i)).collect(),
            SheetSelector::Names(names) => names.iter().map(by_name).collect(),
        }
    }

    /// シートを読み込んで`Grid`を構築する
    ///
    /// 使用範囲の先頭行を行0とし、範囲内の空行も含めてすべての行を読み込みます。
    /// 使用範囲より前の空行・空列は含みません。
    pub fn load_grid(&mut self, sheet_name: &str) -> Result<Grid, XlsxFinError> {
        if !self.sheet_names().iter().any(|name| name == sheet_name) {
            return Err(XlsxFinError::SheetNotFound(sheet_name.to_string()));
        }

        let range = self.workbook.worksheet_range(sheet_name)?;
        Ok(range_to_grid(&range))
    }
}

/// calamineの使用範囲をグリッドへ変換
fn range_to_grid(range: &Range<Data>) -> Grid {
    if range.is_empty() {
        return Grid::default();
    }

    Grid::from_rows(
        range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect(),
    )
}

/// calamineのセル値を変換
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(convert_cell(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(
            convert_cell(&Data::String("Rate".to_string())),
            CellValue::String("Rate".to_string())
        );
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_range_to_grid_starts_at_used_range() {
        let mut range: Range<Data> = Range::new((1, 1), (4, 2));
        range.set_value((1, 1), Data::String("Hours".to_string()));
        range.set_value((1, 2), Data::String("Rate".to_string()));
        range.set_value((2, 1), Data::Float(10.0));
        range.set_value((4, 2), Data::Float(5.0));

        let grid = range_to_grid(&range);

        // 範囲より前の空行・空列は補わない
        assert_eq!(grid.header_names(), vec!["Hours", "Rate"]);
        assert_eq!(grid.rows()[1], vec![CellValue::Number(10.0)]);

        // 範囲内の空行は残る
        assert_eq!(grid.len(), 4);
        assert!(grid.rows()[2].is_empty());
        assert_eq!(grid.rows()[3][1], CellValue::Number(5.0));
    }

    #[test]
    fn test_range_to_grid_empty() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_grid(&range).is_empty());
    }

    #[test]
    fn test_open_invalid_bytes() {
        let result = WorkbookParser::from_bytes(b"not a workbook".to_vec());
        assert!(matches!(result, Err(XlsxFinError::Parse(_))));
    }

    #[test]
    fn test_open_rejects_oversized_input() {
        let security = SecurityConfig::with_max_input_file_size(4);
        let result = WorkbookParser::open(Cursor::new(vec![0u8; 16]), &security);
        assert!(matches!(result, Err(XlsxFinError::SecurityViolation(_))));
    }
}
