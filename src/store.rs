//! Report Store
//!
//! アップロードIDと処理レポートを対応付けて保持するモジュール。
//! ダウンロード時にはここから実際のレポートを取り出して成果物を生成します。

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::types::ProcessingReport;

/// 既定の保持期間（秒）: 1時間
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;
/// 既定の最大保持件数
pub const DEFAULT_CAPACITY: usize = 256;

/// 保存されたレポート
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub report: ProcessingReport,
    /// アップロード時のファイル名
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
}

impl StoredReport {
    pub fn new(report: ProcessingReport, original_filename: impl Into<String>) -> Self {
        Self {
            report,
            original_filename: original_filename.into(),
            created_at: Utc::now(),
        }
    }
}

/// レポートの保存先
///
/// HTTPハンドラーはこのトレイト越しにのみレポートへアクセスします。
pub trait ReportStore: Send + Sync {
    /// レポートを保存し、新しいIDを返す
    fn insert(&self, entry: StoredReport) -> Uuid;

    /// IDに対応するレポートを取得（期限切れ・未登録は`None`）
    fn get(&self, id: &Uuid) -> Option<StoredReport>;

    /// 保持している件数
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// メモリ上のレポートストア
///
/// 期限切れのエントリは`insert`・`get`のたびに取り除かれます。
/// 容量に達している場合は最も古いエントリを追い出します。
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<Uuid, StoredReport>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS, DEFAULT_CAPACITY)
    }
}

impl MemoryStore {
    /// 保持期間（秒）と最大件数を指定して作成
    ///
    /// 容量0は1として扱います。
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        // chrono::Durationはミリ秒単位で i64 に収まる範囲に制限される
        let ttl_secs = ttl_secs.min(i64::MAX as u64 / 1000) as i64;
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, StoredReport>> {
        // ポイズニング時も中身をそのまま使う
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict_expired(&self, entries: &mut HashMap<Uuid, StoredReport>, now: DateTime<Utc>) {
        let before = entries.len();
        entries.retain(|_, entry| now.signed_duration_since(entry.created_at) < self.ttl);

        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} expired report(s)", evicted);
        }
    }
}

impl ReportStore for MemoryStore {
    fn insert(&self, entry: StoredReport) -> Uuid {
        let mut entries = self.lock();
        self.evict_expired(&mut entries, Utc::now());

        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    tracing::debug!("Store at capacity, evicting report {}", id);
                    entries.remove(&id);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        entries.insert(id, entry);
        id
    }

    fn get(&self, id: &Uuid) -> Option<StoredReport> {
        let mut entries = self.lock();
        self.evict_expired(&mut entries, Utc::now());
        entries.get(id).cloned()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> StoredReport {
        StoredReport::new(ProcessingReport::default(), name)
    }

    #[test]
    fn test_insert_and_get() {
        let store = MemoryStore::default();
        let id = store.insert(entry("book.xlsx"));

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.original_filename, "book.xlsx");
        assert_eq!(store.len(), 1);
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let store = MemoryStore::new(60, 8);
        let id = store.insert(entry("old.xlsx"));

        // 作成時刻を保持期間より前にずらす
        store.lock().get_mut(&id).unwrap().created_at = Utc::now() - Duration::seconds(120);

        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = MemoryStore::new(DEFAULT_TTL_SECS, 2);
        let first = store.insert(entry("first.xlsx"));
        store.lock().get_mut(&first).unwrap().created_at = Utc::now() - Duration::seconds(10);
        let second = store.insert(entry("second.xlsx"));
        let third = store.insert(entry("third.xlsx"));

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let store = MemoryStore::new(DEFAULT_TTL_SECS, 0);
        store.insert(entry("a.xlsx"));
        let latest = store.insert(entry("b.xlsx"));

        assert_eq!(store.len(), 1);
        assert!(store.get(&latest).is_some());
    }
}
