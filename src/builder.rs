//! Builder Module
//!
//! Fluent Builder APIを提供し、`Processor`インスタンスを段階的に構築する。
//! `Processor`はワークブック全体を処理し、シートごとの分類・抽出結果を
//! 1つの`ProcessingReport`へ集約します。

use std::io::{Read, Seek};

use tracing::{debug, info};

use crate::api::{SheetKind, SheetSelector};
use crate::classifier::classify;
use crate::error::XlsxFinError;
use crate::extract::{extract_estimate, extract_financial_statement};
use crate::grid::Grid;
use crate::parser::WorkbookParser;
use crate::security::{SecurityConfig, DEFAULT_MAX_UPLOAD_SIZE};
use crate::types::{ProcessingReport, SheetView};

/// 処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ProcessingConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 入力ファイルの最大サイズ（バイト）
    pub max_input_size: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::All,
            max_input_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxfin::{ProcessorBuilder, SheetSelector};
///
/// # fn main() -> Result<(), xlsxfin::XlsxFinError> {
/// let processor = ProcessorBuilder::new()
///     .with_sheet_selector(SheetSelector::Index(0))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProcessorBuilder {
    /// 内部設定（構築中）
    config: ProcessingConfig,
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: すべてのシート
    /// - 入力サイズ上限: 10MB
    pub fn new() -> Self {
        Self {
            config: ProcessingConfig::default(),
        }
    }

    /// 処理対象のシートを選択する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxfin::{ProcessorBuilder, SheetSelector};
    ///
    /// let builder = ProcessorBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Name("Budget".to_string()));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.max_input_size = bytes;
        self
    }

    /// 設定を検証し、`Processor`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxFinError::Config(String)`: 設定の検証に失敗した場合
    ///   * 入力サイズ上限が0
    ///   * 空のシート名、または空のインデックス/名前リスト
    pub fn build(self) -> Result<Processor, XlsxFinError> {
        if self.config.max_input_size == 0 {
            return Err(XlsxFinError::Config(
                "Maximum input size must be greater than zero".to_string(),
            ));
        }

        match &self.config.sheet_selector {
            SheetSelector::Name(name) if name.is_empty() => {
                return Err(XlsxFinError::Config("Sheet name must not be empty".to_string()));
            }
            SheetSelector::Names(names) if names.is_empty() => {
                return Err(XlsxFinError::Config(
                    "Sheet name list must not be empty".to_string(),
                ));
            }
            SheetSelector::Indices(indices) if indices.is_empty() => {
                return Err(XlsxFinError::Config(
                    "Sheet index list must not be empty".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Processor {
            config: self.config,
        })
    }
}

/// ワークブック処理のファサード
///
/// Excelファイルを読み込み、シートごとに分類・抽出を行い、
/// `ProcessingReport`を返します。処理は同期的で、呼び出し間で状態を共有しません。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxfin::ProcessorBuilder;
/// use std::fs::File;
///
/// # fn main() -> Result<(), xlsxfin::XlsxFinError> {
/// let processor = ProcessorBuilder::new().build()?;
/// let report = processor.process(File::open("estimate.xlsx")?)?;
/// println!("grand total: {}", report.summary.grand_total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Processor {
    /// 処理設定
    config: ProcessingConfig,
}

impl Processor {
    /// 入力サイズの上限（バイト）
    pub fn max_input_size(&self) -> u64 {
        self.config.max_input_size
    }

    /// リーダーからワークブックを読み込んで処理する
    pub fn process<R: Read + Seek>(&self, input: R) -> Result<ProcessingReport, XlsxFinError> {
        let security = SecurityConfig::with_max_input_file_size(self.config.max_input_size);
        let parser = WorkbookParser::open(input, &security)?;
        self.process_workbook(parser)
    }

    /// メモリ上のバイト列を処理する
    pub fn process_bytes(&self, bytes: Vec<u8>) -> Result<ProcessingReport, XlsxFinError> {
        SecurityConfig::with_max_input_file_size(self.config.max_input_size)
            .check_size(bytes.len() as u64)?;
        let parser = WorkbookParser::from_bytes(bytes)?;
        self.process_workbook(parser)
    }

    /// 処理フロー
    ///
    /// 1. シート選択
    /// 2. 各シートについて（ワークブック内の順序で）
    ///    - グリッドの読み込み
    ///    - 分類
    ///    - 分類に応じた抽出と集計
    fn process_workbook(&self, mut parser: WorkbookParser) -> Result<ProcessingReport, XlsxFinError> {
        let sheet_names = parser.select_sheets(&self.config.sheet_selector)?;
        let mut aggregator = ReportAggregator::default();

        for sheet_name in &sheet_names {
            let grid = parser.load_grid(sheet_name)?;
            aggregator.add_sheet(sheet_name, &grid);
        }

        let report = aggregator.finish();
        info!(
            sheets = report.summary.total_sheets,
            estimates = report.summary.total_estimates,
            financial_statements = report.summary.total_financial_statements,
            grand_total = report.summary.grand_total,
            "workbook processed"
        );
        Ok(report)
    }
}

/// シートごとの結果を`ProcessingReport`へ集約する
#[derive(Debug, Default)]
pub struct ReportAggregator {
    report: ProcessingReport,
}

impl ReportAggregator {
    /// 1シート分を分類・抽出して集計に加え、その分類を返す
    pub fn add_sheet(&mut self, sheet_name: &str, grid: &Grid) -> SheetKind {
        let kind = classify(grid);
        debug!(sheet = sheet_name, kind = kind.as_str(), rows = grid.len(), "sheet classified");

        self.report.sheets.push((
            sheet_name.to_string(),
            SheetView {
                title: sheet_name.to_string(),
                headers: grid.headers().to_vec(),
                data: grid.records(),
            },
        ));
        self.report.summary.total_sheets += 1;

        match kind {
            SheetKind::Estimate => {
                let estimate = extract_estimate(grid, sheet_name);
                self.report.summary.total_estimates += 1;
                self.report.summary.grand_total += estimate.total;
                self.report.estimates.push(estimate);
            }
            SheetKind::FinancialStatement => {
                let statement = extract_financial_statement(grid, sheet_name);
                self.report.summary.total_financial_statements += 1;
                self.report.financial_statements.push(statement);
            }
            SheetKind::Unclassified => {}
        }

        kind
    }

    /// 集計を完了してレポートを返す
    pub fn finish(self) -> ProcessingReport {
        self.report
    }
}
