//! Output Format Module
//!
//! Strategy Patternによる成果物（PDF / Excel）出力の抽象化を提供するモジュール。
//! どちらの成果物も`ProcessingReport`から決定的に生成されます。

mod excel;
mod pdf;

use crate::error::XlsxFinError;
use crate::types::{ProcessingReport, Record};

pub use excel::ExcelRenderer;
pub use pdf::PdfRenderer;

/// 成果物の種類（Strategy Pattern）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
    Excel,
}

impl ArtifactKind {
    /// ファイル拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Excel => "xlsx",
        }
    }

    /// MIMEタイプ
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
            ArtifactKind::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// 拡張子から種類を判定
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(ArtifactKind::Pdf),
            "xlsx" => Some(ArtifactKind::Excel),
            _ => None,
        }
    }

    /// ダウンロード用のファイル名（例: `<file_id>_processed.pdf`）
    pub fn file_name(&self, file_id: &str) -> String {
        format!("{}_processed.{}", file_id, self.extension())
    }

    /// レポートを成果物のバイト列として出力する
    ///
    /// # 引数
    ///
    /// * `report` - 出力するレポート
    /// * `source_name` - 元のファイル名（表紙・サマリーに記載）
    pub fn render(
        &self,
        report: &ProcessingReport,
        source_name: &str,
    ) -> Result<Vec<u8>, XlsxFinError> {
        match self {
            ArtifactKind::Pdf => PdfRenderer.render(report, source_name),
            ArtifactKind::Excel => ExcelRenderer.render(report, source_name),
        }
    }
}

/// 金額を`$1,234.50`形式で整形
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// 財務諸表の明細行を「摘要」と「金額」の2列に要約する
///
/// 摘要は最初の空でない非数値テキスト（なければ`"Item"`）、
/// 金額は行内で最後に現れる数値。
pub fn financial_line(record: &Record) -> (String, Option<f64>) {
    let description = record
        .iter()
        .filter_map(|(_, v)| v.as_str())
        .map(str::trim)
        .find(|text| !text.is_empty() && text.parse::<f64>().is_err())
        .unwrap_or("Item")
        .to_string();

    let amount = record.iter().filter_map(|(_, v)| v.as_number()).last();

    (description, amount)
}

/// 財務諸表で強調表示する行（合計行）かどうか
pub fn is_total_line(description: &str) -> bool {
    description.to_uppercase().contains("TOTAL")
}
