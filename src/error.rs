//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxfinクレート全体で使用するエラー型
///
/// Excelファイルの読み込み、解析、レポート生成、成果物の出力中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - 入力検証エラー: `InvalidInput`, `SecurityViolation`
/// - 解析エラー: `Parse`, `SheetNotFound`
/// - 出力エラー: `Xlsx`, `Pdf`, `Json`, `Io`
/// - 実行時エラー: `Timeout`, `NotFound`, `Config`
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxfin::XlsxFinError;
/// use std::fs::File;
///
/// fn read_excel_file(path: &str) -> Result<(), XlsxFinError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxFinError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー
    ///
    /// calamineクレートがワークブックを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// Excel成果物の書き込みエラー（rust_xlsxwriter由来）
    #[error("Failed to write Excel file: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// PDF成果物の書き込みエラー（lopdf由来）
    #[error("Failed to write PDF file: {0}")]
    Pdf(#[from] lopdf::Error),

    /// JSONのシリアライズエラー
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 指定されたシートが存在しない
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ProcessorBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use xlsxfin::{ProcessorBuilder, XlsxFinError};
    ///
    /// let result = ProcessorBuilder::new()
    ///     .with_max_input_size(0)
    ///     .build();
    ///
    /// match result {
    ///     Err(XlsxFinError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// アップロード内容の検証に失敗したエラー
    ///
    /// 拡張子が`.xlsx`/`.xls`以外、ファイル名が空、ファイルフィールドが
    /// 存在しないなど、呼び出し側で修正可能な入力の問題です。
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ファイルサイズ制限、パストラバーサルを含むファイル名などが該当します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 解析処理が制限時間内に終わらなかった
    #[error("Processing timed out after {0}s")]
    Timeout(u64),

    /// 保存済みレポートが見つからない（未登録または期限切れ）
    #[error("Not found: {0}")]
    NotFound(String),
}
