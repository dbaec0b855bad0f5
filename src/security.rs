//! Security Module
//!
//! アップロード入力の検証を実装するモジュール。
//! ファイル名（拡張子・パストラバーサル）とファイルサイズの制限を提供します。

use crate::error::XlsxFinError;

/// 受け付けるファイル拡張子（小文字）
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// アップロードの最大サイズ（バイト）: 10MB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 10MB (10_485_760 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl SecurityConfig {
    /// 最大サイズを指定して設定を作成
    pub fn with_max_input_file_size(max_input_file_size: u64) -> Self {
        Self {
            max_input_file_size,
        }
    }

    /// 入力サイズが上限以下であることを検証
    pub fn check_size(&self, size: u64) -> Result<(), XlsxFinError> {
        validate_upload_size(size, self.max_input_file_size)
    }
}

/// アップロードされたファイル名の検証
///
/// パストラバーサル攻撃を防ぎ、Excel形式以外のファイルを拒否します。
///
/// # 戻り値
///
/// * `Ok(())` - ファイル名が安全で、拡張子が`.xlsx`/`.xls`の場合
/// * `Err(XlsxFinError::SecurityViolation)` - パス区切りや`..`を含む場合
/// * `Err(XlsxFinError::InvalidInput)` - 空のファイル名、または対応していない拡張子
pub fn validate_filename(filename: &str) -> Result<(), XlsxFinError> {
    if filename.trim().is_empty() {
        return Err(XlsxFinError::InvalidInput(
            "Empty filename is not allowed".to_string(),
        ));
    }

    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(XlsxFinError::SecurityViolation(format!(
            "Path components are not allowed in filename: {}",
            filename
        )));
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(XlsxFinError::InvalidInput(
            "Only Excel files (.xlsx, .xls) are allowed".to_string(),
        )),
    }
}

/// アップロードサイズの検証
pub fn validate_upload_size(size: u64, max: u64) -> Result<(), XlsxFinError> {
    if size > max {
        return Err(XlsxFinError::SecurityViolation(format!(
            "Input file size exceeds maximum: {} bytes (max: {} bytes)",
            size, max
        )));
    }
    Ok(())
}
