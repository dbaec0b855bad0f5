//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::Serialize;

/// シートの分類結果
///
/// 1シートにつき1回だけ決定され、3つのうちちょうど1つになります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    /// 見積書（明細行と合計金額）
    Estimate,

    /// 財務諸表（収益・費用・純利益などのセクション）
    FinancialStatement,

    /// どちらにも該当しない（`sheets`にのみ記録される）
    Unclassified,
}

impl SheetKind {
    /// ログやJSONで使用する名前
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Estimate => "estimate",
            SheetKind::FinancialStatement => "financial_statement",
            SheetKind::Unclassified => "unclassified",
        }
    }
}

/// シート選択方式
///
/// 処理対象のシートを選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを処理（デフォルト）
    All,

    /// インデックス指定（0始まり）
    ///
    /// 例: `SheetSelector::Index(0)` は最初のシートを選択
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Sheet1".to_string())`
    Name(String),

    /// 複数のインデックス指定
    ///
    /// 例: `SheetSelector::Indices(vec![0, 2, 4])`
    Indices(Vec<usize>),

    /// 複数のシート名指定
    Names(Vec<String>),
}
