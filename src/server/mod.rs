//! HTTP Server Module
//!
//! axumによるアップロード／ダウンロードAPI。
//!
//! - `GET /` : サービス情報
//! - `GET /health` : ヘルスチェック
//! - `POST /api/upload` : ワークブックのアップロードと処理
//! - `GET /api/download/:filename` : PDF / Excel成果物のダウンロード

mod error;
mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::builder::{Processor, ProcessorBuilder};
use crate::error::XlsxFinError;
use crate::security::DEFAULT_MAX_UPLOAD_SIZE;
use crate::store::{MemoryStore, ReportStore, DEFAULT_CAPACITY, DEFAULT_TTL_SECS};

pub use error::ApiError;
pub use handlers::UploadResponse;

/// multipartのヘッダー等に見込む余裕（バイト）
const ENVELOPE_ALLOWANCE: u64 = 1024 * 1024;

/// 既定の処理タイムアウト（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// サーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 1リクエストあたりの処理タイムアウト（秒）
    pub timeout_secs: u64,
    /// アップロードファイルの最大サイズ（バイト）
    pub max_upload_bytes: u64,
    pub store_ttl_secs: u64,
    pub store_capacity: usize,
    /// 許可するオリジン（`None`ならすべて許可）
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_SIZE,
            store_ttl_secs: DEFAULT_TTL_SECS,
            store_capacity: DEFAULT_CAPACITY,
            cors_origin: None,
        }
    }
}

/// ハンドラー間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub processor: Processor,
    pub store: Arc<dyn ReportStore>,
    pub timeout: Duration,
    pub max_upload_bytes: u64,
    cors_origin: Option<HeaderValue>,
}

impl AppState {
    /// 設定を検証して状態を構築する（ストアはメモリ上）
    pub fn new(config: ServerConfig) -> Result<Self, XlsxFinError> {
        let store = Arc::new(MemoryStore::new(
            config.store_ttl_secs,
            config.store_capacity,
        ));
        Self::with_store(config, store)
    }

    /// 任意のストア実装を使って状態を構築する
    pub fn with_store(
        config: ServerConfig,
        store: Arc<dyn ReportStore>,
    ) -> Result<Self, XlsxFinError> {
        if config.timeout_secs == 0 {
            return Err(XlsxFinError::Config(
                "Timeout must be greater than zero".to_string(),
            ));
        }

        let cors_origin = config
            .cors_origin
            .as_deref()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| {
                    XlsxFinError::Config(format!("Invalid CORS origin: {}", origin))
                })
            })
            .transpose()?;

        let processor = ProcessorBuilder::new()
            .with_max_input_size(config.max_upload_bytes)
            .build()?;

        Ok(Self {
            processor,
            store,
            timeout: Duration::from_secs(config.timeout_secs),
            max_upload_bytes: config.max_upload_bytes,
            cors_origin,
        })
    }
}

/// ルーターを構築する
pub fn router(state: AppState) -> Router {
    let cors = match &state.cors_origin {
        Some(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin.clone())),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    let body_limit = state.max_upload_bytes.saturating_add(ENVELOPE_ALLOWANCE);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/upload", post(handlers::upload))
        .route("/api/download/:filename", get(handlers::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_rejects_zero_timeout() {
        let config = ServerConfig {
            timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(AppState::new(config), Err(XlsxFinError::Config(_))));
    }

    #[test]
    fn test_app_state_rejects_invalid_origin() {
        let config = ServerConfig {
            cors_origin: Some("bad\norigin".to_string()),
            ..ServerConfig::default()
        };
        assert!(matches!(AppState::new(config), Err(XlsxFinError::Config(_))));
    }

    #[test]
    fn test_app_state_defaults() {
        let state = AppState::new(ServerConfig::default()).unwrap();
        assert_eq!(state.timeout, Duration::from_secs(30));
        assert_eq!(state.processor.max_input_size(), 10 * 1024 * 1024);
        assert!(state.store.is_empty());
    }
}
