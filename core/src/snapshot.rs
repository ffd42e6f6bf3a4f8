//! Best-effort persistence of the corpus content list.
//!
//! The snapshot is a derived backup of what the index holds: a JSON file of
//! the form `{"document": [...]}`, rewritten on every tick of a
//! [`SnapshotTask`]. Failures are logged and retried on the next tick.

use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    corpus::{CorpusError, DocumentStore},
    index::VectorIndex,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to re-index {failed} of {loaded} snapshot documents: {source}")]
    Rehydrate {
        failed: usize,
        loaded: usize,
        source: CorpusError,
    },
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    document: &'a [String],
}

#[derive(Deserialize)]
struct SnapshotFile {
    document: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `documents` to the snapshot file, replacing the previous snapshot.
    /// The content goes to a sibling `.tmp` file first and is renamed over the
    /// snapshot, so an interrupted write never leaves a truncated snapshot.
    ///
    /// # Errors
    /// [`SnapshotError`] if the file can't be written
    pub async fn snapshot(&self, documents: &[String]) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec(&SnapshotFileRef {
            document: documents,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        debug!(
            "wrote snapshot of {} documents to {}",
            documents.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Read the last snapshot. Anything short of a readable file with a
    /// `document` list yields an empty list.
    pub async fn load(&self) -> Vec<String> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(
                    "no snapshot loaded from {} ({e}), starting with an empty list",
                    self.path.display()
                );
                return vec![];
            }
        };
        match serde_json::from_slice::<SnapshotFile>(&bytes) {
            Ok(file) => {
                info!(
                    "loaded {} documents from {}",
                    file.document.len(),
                    self.path.display()
                );
                file.document
            }
            Err(e) => {
                warn!(
                    "snapshot {} has no readable `document` list ({e}), starting with an empty list",
                    self.path.display()
                );
                vec![]
            }
        }
    }

    /// Add every document of the last snapshot to `store`, returns how many
    /// were indexed. Empty entries are skipped.
    ///
    /// # Errors
    /// [`SnapshotError::Rehydrate`] if any document was rejected by the index.
    /// The snapshot file is left untouched, the caller must not start
    /// snapshotting `store` since that would drop the rejected documents.
    pub async fn rehydrate<I: VectorIndex>(
        &self,
        store: &DocumentStore<I>,
    ) -> Result<usize, SnapshotError> {
        let documents = self.load().await;
        let loaded = documents.len();
        let mut indexed = 0;
        let mut failed = 0;
        let mut last_error = None;
        for content in documents {
            match store.add(&content).await {
                Ok(()) => indexed += 1,
                Err(CorpusError::InvalidInput(reason)) => {
                    debug!("skipping snapshot entry: {reason}");
                }
                Err(e) => {
                    warn!("failed to re-index snapshot document: {e}");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }
        if let Some(source) = last_error {
            return Err(SnapshotError::Rehydrate {
                failed,
                loaded,
                source,
            });
        }
        info!("rehydrated {indexed} documents from {}", self.path.display());
        Ok(indexed)
    }

    /// Snapshot the current content of `store`. Failures are logged, never
    /// returned; the result tells whether a snapshot was written.
    pub async fn persist<I: VectorIndex>(&self, store: &DocumentStore<I>) -> bool {
        let documents = match store.list_all().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("failed to list documents for snapshot: {e}");
                return false;
            }
        };
        match self.snapshot(&documents).await {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to write snapshot to {}: {e}", self.path.display());
                false
            }
        }
    }
}

/// Background task snapshotting a [`DocumentStore`] at a fixed period.
///
/// The task stops when [`SnapshotTask::shutdown`] is called or the handle is
/// dropped.
pub struct SnapshotTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SnapshotTask {
    /// # Panics
    /// if `period` is zero
    pub fn spawn<I: VectorIndex + 'static>(
        store: Arc<DocumentStore<I>>,
        manager: SnapshotManager,
        period: Duration,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.persist(&store).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("snapshot task stopped");
        });
        info!("snapshotting every {}s", period.as_secs_f64());
        Self { shutdown, handle }
    }

    /// Stop the ticker and wait for an in-flight snapshot to finish.
    pub async fn shutdown(self) {
        _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("snapshot task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        embeddings::{Embedder, EmbedderError, EmbeddingModel},
        providers::embeddings::HashingEmbedding,
        vector_store::InMemoryVectorStore,
    };
    use async_trait::async_trait;

    struct UnavailableModel;

    #[async_trait]
    impl EmbeddingModel for UnavailableModel {
        async fn embed(&self, _data: &str) -> Result<Vec<f64>, EmbedderError> {
            Err(EmbedderError::RequestError("connection refused".to_string()))
        }
    }

    fn store() -> Arc<DocumentStore<Embedder<InMemoryVectorStore, HashingEmbedding>>> {
        Arc::new(DocumentStore::new(Embedder::new(
            InMemoryVectorStore::new(),
            HashingEmbedding::default(),
        )))
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path().join("documents").join("datas.json"));
        let store = store();
        for doc in ["The sky is blue", "Grass is green", "Snow is white"] {
            store.add(doc).await.unwrap();
        }

        let listed = store.list_all().await.unwrap();
        manager.snapshot(&listed).await.unwrap();
        assert_eq!(sorted(manager.load().await), sorted(listed));

        let raw = std::fs::read_to_string(manager.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["document"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path().join("datas.json"));
        manager
            .snapshot(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        manager.snapshot(&["c".to_string()]).await.unwrap();
        assert_eq!(manager.load().await, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_snapshot_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path().join("datas.json"));
        manager.snapshot(&["a".to_string()]).await.unwrap();
        manager.snapshot(&["b".to_string()]).await.unwrap();

        let names = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["datas.json".to_string()]);
        assert_eq!(manager.load().await, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_temp_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path().join("datas.json"));
        manager.snapshot(&["kept".to_string()]).await.unwrap();
        // leftover of a write interrupted before the rename
        std::fs::write(dir.path().join("datas.json.tmp"), r#"{"docum"#).unwrap();
        assert_eq!(manager.load().await, vec!["kept".to_string()]);

        manager.snapshot(&["next".to_string()]).await.unwrap();
        assert_eq!(manager.load().await, vec!["next".to_string()]);
        assert!(!dir.path().join("datas.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();

        let missing = SnapshotManager::new(dir.path().join("missing.json"));
        assert!(missing.load().await.is_empty());

        let no_field = dir.path().join("no_field.json");
        std::fs::write(&no_field, r#"{"documents": ["x"]}"#).unwrap();
        assert!(SnapshotManager::new(no_field).load().await.is_empty());

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(SnapshotManager::new(garbage).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_swallows_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be makes the write fail
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        let manager = SnapshotManager::new(&path);

        let store = store();
        store.add("doc").await.unwrap();
        assert!(manager.snapshot(&["doc".to_string()]).await.is_err());
        assert!(!manager.persist(&store).await);
    }

    #[tokio::test]
    async fn test_rehydrate_skips_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datas.json");
        std::fs::write(&path, r#"{"document": ["The sky is blue", "", "The sky is blue", "Grass is green"]}"#)
            .unwrap();
        let manager = SnapshotManager::new(path);

        let store = store();
        assert_eq!(manager.rehydrate(&store).await.unwrap(), 3);
        assert_eq!(
            sorted(store.list_all().await.unwrap()),
            vec!["Grass is green".to_string(), "The sky is blue".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_rehydrate_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datas.json");
        std::fs::write(&path, r#"{"document": ["a", "b", "c"]}"#).unwrap();
        let manager = SnapshotManager::new(path);

        let store = DocumentStore::new(Embedder::new(
            InMemoryVectorStore::new(),
            UnavailableModel,
        ));
        let result = manager.rehydrate(&store).await;
        assert!(matches!(
            result,
            Err(SnapshotError::Rehydrate {
                failed: 3,
                loaded: 3,
                ..
            })
        ));
        assert_eq!(
            manager.load().await,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_snapshots_on_every_tick() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path().join("datas.json"));
        let store = store();
        let task = SnapshotTask::spawn(store.clone(), manager.clone(), Duration::from_secs(60));

        store.add("first").await.unwrap();
        // nothing is written before the first period elapses
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!manager.path().exists());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(manager.load().await, vec!["first".to_string()]);

        store.add("second").await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(
            sorted(manager.load().await),
            vec!["first".to_string(), "second".to_string()]
        );

        task.shutdown().await;
        store.clear_all().await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(manager.load().await.len(), 2);
    }
}
