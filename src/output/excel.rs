//! Excel Renderer
//!
//! rust_xlsxwriterで処理レポートをXLSXワークブックとして出力します。
//! Summaryシートの後に、見積書ごとの`Estimate_*`シートと
//! 財務諸表ごとの`Financial_*`シートが続きます。

use std::collections::HashSet;

use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use unicode_width::UnicodeWidthStr;

use super::{financial_line, format_currency, is_total_line};
use crate::error::XlsxFinError;
use crate::types::{CellValue, Estimate, FinancialStatement, ProcessingReport};

/// Excelのシート名の最大長
const MAX_SHEET_NAME_LEN: usize = 31;
/// シート名に使えない文字
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
/// 自動調整する列幅の上限（文字数）
const MAX_COLUMN_WIDTH: usize = 50;

const CURRENCY_FORMAT: &str = "$#,##0.00";
const AMOUNT_FORMAT: &str = "#,##0.00";

/// Excel出力
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelRenderer;

impl ExcelRenderer {
    /// レポートをXLSXのバイト列として出力
    pub fn render(
        &self,
        report: &ProcessingReport,
        source_name: &str,
    ) -> Result<Vec<u8>, XlsxFinError> {
        let styles = Styles::new();
        let mut workbook = Workbook::new();
        let mut used_names = HashSet::new();

        let summary_name = unique_sheet_name("Summary", &mut used_names);
        write_summary(
            workbook.add_worksheet().set_name(&summary_name)?,
            report,
            source_name,
            &styles,
        )?;

        for estimate in &report.estimates {
            let name = unique_sheet_name(
                &format!("Estimate_{}", estimate.sheet_name),
                &mut used_names,
            );
            write_estimate(workbook.add_worksheet().set_name(&name)?, estimate, &styles)?;
        }

        for statement in &report.financial_statements {
            let name = unique_sheet_name(
                &format!("Financial_{}", statement.sheet_name),
                &mut used_names,
            );
            write_statement(workbook.add_worksheet().set_name(&name)?, statement, &styles)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// 出力で使う書式一式
struct Styles {
    title: Format,
    label: Format,
    header: Format,
    cell: Format,
    amount: Format,
    currency: Format,
    section: Format,
    total_label: Format,
    total_amount: Format,
}

impl Styles {
    fn new() -> Self {
        let accent = Color::RGB(0x366092);
        let total_fill = Color::RGB(0xD9E2F3);

        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_font_color(accent),
            label: Format::new().set_bold(),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(accent)
                .set_border(FormatBorder::Thin),
            cell: Format::new().set_border(FormatBorder::Thin),
            amount: Format::new()
                .set_num_format(AMOUNT_FORMAT)
                .set_border(FormatBorder::Thin),
            currency: Format::new().set_bold().set_num_format(CURRENCY_FORMAT),
            section: Format::new().set_bold().set_font_size(12),
            total_label: Format::new()
                .set_bold()
                .set_background_color(total_fill)
                .set_border(FormatBorder::Thin),
            total_amount: Format::new()
                .set_bold()
                .set_num_format(AMOUNT_FORMAT)
                .set_background_color(total_fill)
                .set_border(FormatBorder::Thin),
        }
    }
}

fn write_summary(
    worksheet: &mut Worksheet,
    report: &ProcessingReport,
    source_name: &str,
    styles: &Styles,
) -> Result<(), XlsxFinError> {
    let summary = &report.summary;
    let mut widths = ColumnWidths::default();

    worksheet.write_string_with_format(0, 0, "Excel Processing Report - Summary", &styles.title)?;
    worksheet.write_string_with_format(2, 0, "Source File:", &styles.label)?;
    worksheet.write_string(2, 1, source_name)?;
    widths.observe(1, source_name);

    let counts = [
        ("Total Estimates", summary.total_estimates),
        ("Total Financial Statements", summary.total_financial_statements),
        ("Total Sheets Processed", summary.total_sheets),
    ];
    for (offset, (label, value)) in counts.iter().enumerate() {
        let row = 4 + offset as u32;
        worksheet.write_string_with_format(row, 0, *label, &styles.label)?;
        worksheet.write_number(row, 1, *value as f64)?;
        widths.observe(0, label);
    }

    worksheet.write_string_with_format(7, 0, "Grand Total", &styles.label)?;
    worksheet.write_number_with_format(7, 1, summary.grand_total, &styles.currency)?;
    widths.observe(1, &format_currency(summary.grand_total));

    widths.apply(worksheet)
}

fn write_estimate(
    worksheet: &mut Worksheet,
    estimate: &Estimate,
    styles: &Styles,
) -> Result<(), XlsxFinError> {
    let mut widths = ColumnWidths::default();
    let total_col = estimate.headers.len();

    worksheet.write_string_with_format(0, 0, &estimate.title, &styles.title)?;

    let total_header = "Total".to_string();
    let header_row = estimate.headers.iter().chain(std::iter::once(&total_header));
    for (col, header) in header_row.enumerate() {
        worksheet.write_string_with_format(2, column(col), header, &styles.header)?;
        widths.observe(col, header);
    }

    let mut row: u32 = 3;
    for item in &estimate.items {
        for (col, header) in estimate.headers.iter().enumerate() {
            if let Some(value) = item.fields.get(header) {
                write_cell(worksheet, row, column(col), value, styles)?;
                widths.observe(col, &value.as_raw_string());
            }
        }
        if let Some(total) = item.total {
            worksheet.write_number_with_format(row, column(total_col), total, &styles.amount)?;
            widths.observe(total_col, &format_currency(total));
        }
        row += 1;
    }

    // 合計行は「Total」列とその左隣に置く
    let value_col = total_col.max(1);
    worksheet.write_string_with_format(row, column(value_col - 1), "TOTAL:", &styles.total_label)?;
    worksheet.write_number_with_format(
        row,
        column(value_col),
        estimate.total,
        &styles.total_amount,
    )?;
    widths.observe(value_col, &format_currency(estimate.total));

    widths.apply(worksheet)
}

fn write_statement(
    worksheet: &mut Worksheet,
    statement: &FinancialStatement,
    styles: &Styles,
) -> Result<(), XlsxFinError> {
    let mut widths = ColumnWidths::default();

    worksheet.write_string_with_format(0, 0, &statement.title, &styles.title)?;

    let mut row: u32 = 2;
    for section in &statement.sections {
        worksheet.write_string_with_format(row, 0, &section.name, &styles.section)?;
        widths.observe(0, &section.name);
        row += 1;

        if section.items.is_empty() {
            row += 1;
            continue;
        }

        worksheet.write_string_with_format(row, 0, "Description", &styles.header)?;
        worksheet.write_string_with_format(row, 1, "Amount", &styles.header)?;
        row += 1;

        for item in &section.items {
            let (description, amount) = financial_line(item);
            let (label_format, amount_format) = if is_total_line(&description) {
                (&styles.total_label, &styles.total_amount)
            } else {
                (&styles.cell, &styles.amount)
            };

            worksheet.write_string_with_format(row, 0, &description, label_format)?;
            widths.observe(0, &description);
            if let Some(amount) = amount {
                worksheet.write_number_with_format(row, 1, amount, amount_format)?;
                widths.observe(1, &format_currency(amount));
            }
            row += 1;
        }

        row += 1;
    }

    widths.apply(worksheet)
}

/// セル値を型に応じて書き込む（空セルは書き込まない）
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    styles: &Styles,
) -> Result<(), XlsxFinError> {
    match value {
        CellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, &styles.cell)?;
        }
        CellValue::String(s) | CellValue::Error(s) => {
            worksheet.write_string_with_format(row, col, s, &styles.cell)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, &styles.cell)?;
        }
        CellValue::Empty => {}
    }
    Ok(())
}

fn column(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(u16::MAX)
}

/// 列ごとの最大表示幅
#[derive(Debug, Default)]
struct ColumnWidths {
    widths: Vec<usize>,
}

impl ColumnWidths {
    fn observe(&mut self, col: usize, text: &str) {
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        self.widths[col] = self.widths[col].max(text.width());
    }

    fn apply(&self, worksheet: &mut Worksheet) -> Result<(), XlsxFinError> {
        for (col, width) in self.widths.iter().enumerate() {
            if *width > 0 {
                let width = (*width + 2).min(MAX_COLUMN_WIDTH);
                worksheet.set_column_width(column(col), width as f64)?;
            }
        }
        Ok(())
    }
}

/// Excelの規則に合うシート名へ変換する
///
/// 禁止文字は`_`に置き換え、31文字に切り詰める。
/// 先頭・末尾のアポストロフィも使えないため取り除く。
pub(crate) fn sanitize_sheet_name(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches('\'');
    let truncated: String = trimmed.chars().take(MAX_SHEET_NAME_LEN).collect();

    if truncated.trim().is_empty() {
        "Sheet".to_string()
    } else {
        truncated
    }
}

/// ワークブック内で一意な（大文字小文字を区別しない）シート名を返す
fn unique_sheet_name(raw: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_sheet_name(raw);
    let mut candidate = base.clone();
    let mut counter = 2;

    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!("~{}", counter);
        let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        counter += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}
