//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! 抽出結果（見積書・財務諸表）とワークブック単位のレポートもここで定義します。

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// セルの値を表す列挙型
///
/// JSONへは値そのもの（数値・文字列・論理値）として、空セルは`null`として出力されます。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 文字列セルの場合のみ中身を返す
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 値を文字列として取得（書式適用前）
    ///
    /// 整数値の数値は小数点なしで出力します（`10.0` → `"10"`）。
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// 値を数値として解釈する
    ///
    /// * 数値セルはそのまま（有限値のみ）
    /// * 文字列セルは前後の空白と桁区切りの`,`を除去してから`f64`として解析
    /// * それ以外（空セル、論理値、エラー値）は`None`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::String(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }
}

/// ヘッダー名 → セル値の順序付きマッピング（1データ行分）
///
/// 挿入順を保持し、同名キーは後から挿入した値で上書きします。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, CellValue)>,
}

impl Record {
    /// 空のレコードを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// キーと値を追加する（既存キーの場合は位置を保ったまま値を置き換える）
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// キーに対応する値を取得
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// キーに対応する値を数値として取得
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(CellValue::as_number)
    }

    /// 挿入順にエントリを走査
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// エントリ数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// エントリが存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// 見積書の明細行
///
/// `fields`は元シートのヘッダーとセル値の対応、`total`は
/// `Quantity × Rate`または`Hours × Rate`から算出した金額。算出できない場合は
/// 行自身の数値の`Total`、それもなければ`None`。
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateItem {
    pub fields: Record,
    pub total: Option<f64>,
}

impl Serialize for EstimateItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // 算出済みの Total は元の "Total" 列より優先する
        let overrides_total = self.total.is_some();
        let len = self.fields.len() + usize::from(overrides_total && self.fields.get("Total").is_none());
        let mut map = serializer.serialize_map(Some(len))?;
        for (k, v) in self.fields.iter() {
            if overrides_total && k == "Total" {
                continue;
            }
            map.serialize_entry(k, v)?;
        }
        if let Some(total) = self.total {
            map.serialize_entry("Total", &total)?;
        }
        map.end()
    }
}

/// 見積書
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub sheet_name: String,
    pub title: String,
    /// 元シートのヘッダー行（空セルを除く）
    pub headers: Vec<String>,
    pub items: Vec<EstimateItem>,
    pub total: f64,
}

/// 財務諸表のセクション
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSection {
    pub name: String,
    pub items: Vec<Record>,
}

/// 財務諸表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialStatement {
    pub sheet_name: String,
    pub title: String,
    pub sections: Vec<FinancialSection>,
}

/// 分類に関係なくすべてのシートを記録する素のビュー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetView {
    pub title: String,
    pub headers: Vec<CellValue>,
    pub data: Vec<Record>,
}

/// レポートの集計値
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_estimates: usize,
    pub total_financial_statements: usize,
    pub total_sheets: usize,
    pub grand_total: f64,
}

/// ワークブック1つ分の処理結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingReport {
    pub estimates: Vec<Estimate>,
    pub financial_statements: Vec<FinancialStatement>,
    /// シート名 → 素のビュー（ワークブック内の順序を保持）
    #[serde(serialize_with = "serialize_sheets")]
    pub sheets: Vec<(String, SheetView)>,
    pub summary: Summary,
}

impl ProcessingReport {
    /// シート名でビューを取得
    pub fn sheet(&self, name: &str) -> Option<&SheetView> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

fn serialize_sheets<S: Serializer>(
    sheets: &[(String, SheetView)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(sheets.len()))?;
    for (name, view) in sheets {
        map.serialize_entry(name, view)?;
    }
    map.end()
}
