use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// An analysis kept for report generation.
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    /// The `result` object returned by `/analyze`
    pub result: Value,
    pub overlay_path: Option<PathBuf>,
    pub created_at: Instant,
}

impl StoredAnalysis {
    pub fn new(result: Value, overlay_path: Option<PathBuf>) -> Self {
        Self {
            result,
            overlay_path,
            created_at: Instant::now(),
        }
    }
}

/// LRU of recent analyses with a per-entry time to live.
///
/// Entries leaving the store, by eviction or expiry, take their overlay file with them.
pub struct AnalysisStore {
    entries: Mutex<LruCache<Uuid, StoredAnalysis>>,
    ttl: Duration,
}

impl AnalysisStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Uuid, StoredAnalysis>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &StoredAnalysis) -> bool {
        entry.created_at.elapsed() >= self.ttl
    }

    pub fn insert(&self, id: Uuid, analysis: StoredAnalysis) {
        let displaced = self.lock().push(id, analysis);

        if let Some((old_id, old)) = displaced {
            tracing::debug!(request_id = %old_id, "Analysis evicted");
            if let Some(path) = old.overlay_path {
                remove_overlay(&path);
            }
        }
    }

    /// Fetch an entry and mark it recently used. Expired entries are dropped.
    pub fn get(&self, id: &Uuid) -> Option<StoredAnalysis> {
        let mut entries = self.lock();
        let expired = self.is_expired(entries.get(id)?);

        if expired {
            let removed = entries.pop(id);
            drop(entries);
            tracing::debug!(request_id = %id, "Analysis expired");
            if let Some(path) = removed.and_then(|entry| entry.overlay_path) {
                remove_overlay(&path);
            }
            return None;
        }

        entries.get(id).cloned()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let removed: Vec<StoredAnalysis> = {
            let mut entries = self.lock();
            let expired: Vec<Uuid> = entries
                .iter()
                .filter(|(_, entry)| self.is_expired(entry))
                .map(|(id, _)| *id)
                .collect();
            expired.iter().filter_map(|id| entries.pop(id)).collect()
        };

        for path in removed.iter().filter_map(|entry| entry.overlay_path.as_deref()) {
            remove_overlay(path);
        }

        removed.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_overlay(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::trace!(path = %path.display(), "Overlay removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove overlay"),
    }
}

/// Periodically purge expired analyses until the runtime shuts down.
pub fn spawn_purge_task(store: Arc<AnalysisStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::info!(purged, remaining = store.len(), "Purged expired analyses");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis_with_file(dir: &Path, name: &str) -> (StoredAnalysis, PathBuf) {
        let path = dir.join(name);
        std::fs::write(&path, b"png").unwrap();
        (StoredAnalysis::new(json!({"mode": "mock"}), Some(path.clone())), path)
    }

    #[test]
    fn test_insert_and_get() {
        let store = AnalysisStore::new(4, Duration::from_secs(60));
        let id = Uuid::new_v4();

        store.insert(id, StoredAnalysis::new(json!({"width": 64}), None));

        let entry = store.get(&id).unwrap();
        assert_eq!(entry.result["width"], 64);
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used_and_its_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(2, Duration::from_secs(60));

        let (a, a_path) = analysis_with_file(dir.path(), "a.png");
        let (b, b_path) = analysis_with_file(dir.path(), "b.png");
        let (c, c_path) = analysis_with_file(dir.path(), "c.png");
        let (id_a, id_b, id_c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.insert(id_a, a);
        store.insert(id_b, b);
        // Touch a so b becomes least recently used
        assert!(store.get(&id_a).is_some());
        store.insert(id_c, c);

        assert_eq!(store.len(), 2);
        assert!(store.get(&id_b).is_none());
        assert!(store.get(&id_a).is_some());
        assert!(store.get(&id_c).is_some());
        assert!(!b_path.exists());
        assert!(a_path.exists());
        assert!(c_path.exists());
    }

    #[test]
    fn test_expired_entries_are_dropped_on_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(4, Duration::ZERO);
        let (analysis, path) = analysis_with_file(dir.path(), "old.png");
        let id = Uuid::new_v4();

        store.insert(id, analysis);

        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_purge_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(8, Duration::ZERO);
        for i in 0..3 {
            let (analysis, _) = analysis_with_file(dir.path(), &format!("{i}.png"));
            store.insert(Uuid::new_v4(), analysis);
        }

        assert_eq!(store.purge_expired(), 3);
        assert!(store.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_purge_keeps_fresh_entries() {
        let store = AnalysisStore::new(8, Duration::from_secs(3600));
        store.insert(Uuid::new_v4(), StoredAnalysis::new(json!({}), None));

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let store = AnalysisStore::new(0, Duration::from_secs(60));
        store.insert(Uuid::new_v4(), StoredAnalysis::new(json!({}), None));
        store.insert(Uuid::new_v4(), StoredAnalysis::new(json!({}), None));
        assert_eq!(store.len(), 1);
    }
}
