//! PDF Renderer
//!
//! lopdfで処理レポートをA4のPDFとして組版します。
//! 標準14フォント（Helvetica / Helvetica-Bold）のみを使用するため、
//! フォントの埋め込みは行いません。

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use unicode_width::UnicodeWidthChar;

use super::{financial_line, format_currency, is_total_line};
use crate::error::XlsxFinError;
use crate::types::{Estimate, FinancialStatement, ProcessingReport, Summary};

/// A4（ポイント）
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const ROW_HEIGHT: f32 = 16.0;
const CELL_PADDING: f32 = 3.0;
const BODY_SIZE: f32 = 9.0;

/// ヘッダー行の塗り（#366092）
const HEADER_FILL: (f32, f32, f32) = (0.212, 0.376, 0.573);
/// 合計・セクション行の塗り（#D9E2F3）
const TOTAL_FILL: (f32, f32, f32) = (0.851, 0.886, 0.953);

const REGULAR_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

/// PDF出力
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// レポートをPDFのバイト列として出力
    pub fn render(
        &self,
        report: &ProcessingReport,
        source_name: &str,
    ) -> Result<Vec<u8>, XlsxFinError> {
        let mut layout = PageLayout::new();

        layout.text(MARGIN, 18.0, true, "Excel Processing Report");
        layout.advance(10.0);
        layout.text(MARGIN, 10.0, false, &format!("Source File: {}", source_name));
        layout.advance(12.0);

        if !report.estimates.is_empty() {
            layout.section_heading("ESTIMATES");
            for estimate in &report.estimates {
                render_estimate(&mut layout, estimate);
            }
        }

        if !report.financial_statements.is_empty() {
            layout.section_heading("FINANCIAL STATEMENTS");
            for statement in &report.financial_statements {
                render_statement(&mut layout, statement);
            }
        }

        layout.section_heading("SUMMARY");
        render_summary(&mut layout, &report.summary);

        layout.into_document()
    }
}

fn render_estimate(layout: &mut PageLayout, estimate: &Estimate) {
    layout.heading(&estimate.title);

    let mut header = estimate.headers.clone();
    header.push("Total".to_string());
    let table = Table::even(header);
    layout.table_header(&table);

    for item in &estimate.items {
        let mut cells: Vec<String> = estimate
            .headers
            .iter()
            .map(|name| {
                item.fields
                    .get(name)
                    .map(|value| value.as_raw_string())
                    .unwrap_or_default()
            })
            .collect();
        cells.push(item.total.map(format_currency).unwrap_or_default());
        layout.table_row(&table, &cells, RowStyle::Plain);
    }

    layout.advance(4.0);
    layout.ensure_space(ROW_HEIGHT);
    layout.text(
        MARGIN,
        11.0,
        true,
        &format!("TOTAL: {}", format_currency(estimate.total)),
    );
    layout.advance(14.0);
}

fn render_statement(layout: &mut PageLayout, statement: &FinancialStatement) {
    layout.heading(&statement.title);

    let table = Table::new(
        vec!["Description".to_string(), "Amount".to_string()],
        vec![CONTENT_WIDTH - 150.0, 150.0],
    );
    layout.table_header(&table);

    for section in &statement.sections {
        layout.table_row(
            &table,
            &[section.name.clone(), String::new()],
            RowStyle::Emphasized,
        );

        for item in &section.items {
            let (description, amount) = financial_line(item);
            let style = if is_total_line(&description) {
                RowStyle::Emphasized
            } else {
                RowStyle::Plain
            };
            let amount = amount.map(format_currency).unwrap_or_default();
            layout.table_row(&table, &[description, amount], style);
        }
    }

    layout.advance(14.0);
}

fn render_summary(layout: &mut PageLayout, summary: &Summary) {
    let table = Table::new(
        vec!["Metric".to_string(), "Value".to_string()],
        vec![CONTENT_WIDTH - 150.0, 150.0],
    );
    layout.table_header(&table);

    let rows = [
        ("Total Estimates", summary.total_estimates.to_string()),
        (
            "Total Financial Statements",
            summary.total_financial_statements.to_string(),
        ),
        ("Total Sheets Processed", summary.total_sheets.to_string()),
    ];
    for (label, value) in rows {
        layout.table_row(&table, &[label.to_string(), value], RowStyle::Plain);
    }
    layout.table_row(
        &table,
        &[
            "Grand Total".to_string(),
            format_currency(summary.grand_total),
        ],
        RowStyle::Emphasized,
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStyle {
    Plain,
    Header,
    Emphasized,
}

/// 表の列定義
struct Table {
    header: Vec<String>,
    widths: Vec<f32>,
}

impl Table {
    fn new(header: Vec<String>, widths: Vec<f32>) -> Self {
        Self { header, widths }
    }

    /// 全列を等幅で割り付ける
    fn even(header: Vec<String>) -> Self {
        let width = CONTENT_WIDTH / header.len().max(1) as f32;
        let widths = vec![width; header.len()];
        Self { header, widths }
    }
}

/// ページ分割を伴う縦方向のレイアウト
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// 次に描画する行の上端（PDF座標系、下が0）
    y: f32,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// 残りの高さが足りなければ改ページする
    ///
    /// 改ページした場合は`true`を返す。
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    /// 上端`self.y`からフォントサイズ分下がった位置にテキストを置く
    fn text(&mut self, x: f32, size: f32, bold: bool, text: &str) {
        self.advance(size);
        self.push_text(x, self.y, size, bold, text);
    }

    fn push_text(&mut self, x: f32, y: f32, size: f32, bold: bool, text: &str) {
        let font = if bold { BOLD_FONT } else { REGULAR_FONT };
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.to_vec()), Object::Real(size)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_text(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, rgb: (f32, f32, f32)) {
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "rg",
                vec![Object::Real(rgb.0), Object::Real(rgb.1), Object::Real(rgb.2)],
            ),
            Operation::new(
                "re",
                vec![
                    Object::Real(x),
                    Object::Real(y),
                    Object::Real(width),
                    Object::Real(height),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn section_heading(&mut self, title: &str) {
        self.ensure_space(3.0 * ROW_HEIGHT);
        self.text(MARGIN, 14.0, true, title);
        self.advance(8.0);
    }

    fn heading(&mut self, title: &str) {
        // 見出しだけがページ末尾に残らないよう、ヘッダー行と1行分を確保する
        self.ensure_space(4.0 * ROW_HEIGHT);
        self.text(MARGIN, 12.0, true, title);
        self.advance(6.0);
    }

    fn table_header(&mut self, table: &Table) {
        self.ensure_space(2.0 * ROW_HEIGHT);
        self.draw_row(table, &table.header, RowStyle::Header);
    }

    /// 表の1行を描画する（改ページ時はヘッダー行を繰り返す）
    fn table_row(&mut self, table: &Table, cells: &[String], style: RowStyle) {
        if self.ensure_space(ROW_HEIGHT) {
            self.draw_row(table, &table.header, RowStyle::Header);
        }
        self.draw_row(table, cells, style);
    }

    fn draw_row(&mut self, table: &Table, cells: &[String], style: RowStyle) {
        let bottom = self.y - ROW_HEIGHT;
        let total_width: f32 = table.widths.iter().sum();

        match style {
            RowStyle::Header => {
                self.fill_rect(MARGIN, bottom, total_width, ROW_HEIGHT, HEADER_FILL)
            }
            RowStyle::Emphasized => {
                self.fill_rect(MARGIN, bottom, total_width, ROW_HEIGHT, TOTAL_FILL)
            }
            RowStyle::Plain => {}
        }

        let bold = style != RowStyle::Plain;
        let mut x = MARGIN;
        for (index, width) in table.widths.iter().enumerate() {
            let cell = cells.get(index).map(String::as_str).unwrap_or("");
            if !cell.is_empty() {
                let fitted = truncate_to_width(cell, width - 2.0 * CELL_PADDING, BODY_SIZE);
                if style == RowStyle::Header {
                    self.current.push(Operation::new(
                        "rg",
                        vec![Object::Integer(1), Object::Integer(1), Object::Integer(1)],
                    ));
                    self.push_text(x + CELL_PADDING, bottom + 4.5, BODY_SIZE, bold, &fitted);
                    self.current.push(Operation::new(
                        "rg",
                        vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
                    ));
                } else {
                    self.push_text(x + CELL_PADDING, bottom + 4.5, BODY_SIZE, bold, &fitted);
                }
            }
            x += width;
        }

        self.y = bottom;
    }

    /// 全ページをPDF文書にまとめてバイト列に書き出す
    fn into_document(mut self) -> Result<Vec<u8>, XlsxFinError> {
        self.new_page();
        let page_count = self.pages.len();

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary("Helvetica"));
        let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
        let fonts = Dictionary::from_iter(vec![
            ("F1", Object::Reference(regular_id)),
            ("F2", Object::Reference(bold_id)),
        ]);
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(fonts),
        )]));

        let mut page_ids: Vec<ObjectId> = Vec::with_capacity(page_count);
        for (index, mut operations) in self.pages.into_iter().enumerate() {
            let footer = format!("Page {} of {}", index + 1, page_count);
            operations.extend(footer_operations(&footer));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(PAGE_WIDTH),
                        Object::Real(PAGE_HEIGHT),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Reference(resources_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_count as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn font_dictionary(base_font: &str) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(base_font.as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

fn footer_operations(footer: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(REGULAR_FONT.to_vec()), Object::Real(8.0)],
        ),
        Operation::new(
            "Td",
            vec![Object::Real(PAGE_WIDTH - MARGIN - 60.0), Object::Real(MARGIN / 2.0)],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(encode_text(footer), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// WinAnsiEncodingで表現できない文字は`?`に置き換える
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            if c.is_control() {
                return b' ';
            }
            match c as u32 {
                code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
                _ => b'?',
            }
        })
        .collect()
}

/// 表示幅（ポイントの概算）に収まるよう文字列を切り詰める
///
/// Helveticaの平均字幅をフォントサイズの半分として見積もり、
/// 全角文字はunicode-widthの表示幅2として数える。
fn truncate_to_width(text: &str, max_width: f32, font_size: f32) -> String {
    let unit = font_size * 0.5;
    let max_units = (max_width / unit).floor().max(0.0) as usize;

    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_units {
        return text.to_string();
    }

    let budget = max_units.saturating_sub(2);
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        let width = c.width().unwrap_or(0);
        if used + width > budget {
            break;
        }
        used += width;
        truncated.push(c);
    }
    truncated.push_str("..");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, EstimateItem, FinancialSection, Record};

    fn sample_report(item_count: usize) -> ProcessingReport {
        let items = (0..item_count)
            .map(|i| {
                let mut fields = Record::new();
                fields.insert("Task", CellValue::String(format!("Task {}", i)));
                fields.insert("Hours", CellValue::Number(2.0));
                fields.insert("Rate", CellValue::Number(50.0));
                EstimateItem {
                    fields,
                    total: Some(100.0),
                }
            })
            .collect();

        let mut revenue = Record::new();
        revenue.insert("Item", CellValue::String("Sales (net)".to_string()));
        revenue.insert("Amount", CellValue::Number(1200.0));

        ProcessingReport {
            estimates: vec![Estimate {
                sheet_name: "Quote".to_string(),
                title: "Quote - Project Estimate".to_string(),
                headers: vec!["Task".to_string(), "Hours".to_string(), "Rate".to_string()],
                items,
                total: 100.0 * item_count as f64,
            }],
            financial_statements: vec![FinancialStatement {
                sheet_name: "PL".to_string(),
                title: "PL - Financial Statement".to_string(),
                sections: vec![FinancialSection {
                    name: "REVENUE".to_string(),
                    items: vec![revenue],
                }],
            }],
            sheets: Vec::new(),
            summary: Summary {
                total_estimates: 1,
                total_financial_statements: 1,
                total_sheets: 2,
                grand_total: 100.0 * item_count as f64,
            },
        }
    }

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(*id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_render_single_page() {
        let bytes = PdfRenderer.render(&sample_report(3), "book.xlsx").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 1);
        let text = &pages[0];
        assert!(text.contains("Source File: book.xlsx"));
        assert!(text.contains("ESTIMATES"));
        assert!(text.contains("TOTAL: $300.00"));
        assert!(text.contains("FINANCIAL STATEMENTS"));
        assert!(text.contains("REVENUE"));
        assert!(text.contains("$1,200.00"));
        assert!(text.contains("SUMMARY"));
        assert!(text.contains("Page 1 of 1"));
    }

    #[test]
    fn test_render_breaks_pages() {
        let bytes = PdfRenderer.render(&sample_report(120), "big.xlsx").unwrap();
        let pages = page_texts(&bytes);

        assert!(pages.len() > 1);
        // 改ページ後もヘッダー行が繰り返される
        assert!(pages[1].contains("Hours"));
        assert!(pages.last().unwrap().contains("SUMMARY"));
    }

    #[test]
    fn test_render_empty_report() {
        let bytes = PdfRenderer
            .render(&ProcessingReport::default(), "empty.xlsx")
            .unwrap();
        let pages = page_texts(&bytes);

        assert_eq!(pages.len(), 1);
        assert!(!pages[0].contains("ESTIMATES"));
        assert!(pages[0].contains("Grand Total"));
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("Café"), b"Caf\xe9".to_vec());
        assert_eq!(encode_text("見積"), b"??".to_vec());
        assert_eq!(encode_text("a\tb"), b"a b".to_vec());
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 100.0, 10.0), "short");
        let truncated = truncate_to_width("a very long description", 50.0, 10.0);
        assert_eq!(truncated, "a very l..");
        assert_eq!(truncate_to_width("見積書", 20.0, 10.0), "見..");
    }
}
