//! Corpus lifecycle
//!
//! A corpus is a glossary CSV embedded into a searchable index. The built
//! result is shared behind an `Arc` and swapped atomically on rebuild, so
//! in-flight searches keep their snapshot while a new corpus is installed.

pub mod loader;
pub mod store;

pub use loader::{clean_pairs, load_csv, CorpusError};
pub use store::{CorpusMetadata, CorpusStore};

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::backend::{BackendError, EmbeddingBackend};
use crate::govern::CostLedger;
use crate::index::{EmbeddingIndex, IndexError, ReferenceEntry};

/// Texts embedded per backend call during a rebuild
const EMBED_BATCH_SIZE: usize = 100;

/// Errors from building a corpus
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// An immutable built corpus: index plus provenance
#[derive(Debug)]
pub struct LoadedCorpus {
    pub index: EmbeddingIndex,
    pub metadata: CorpusMetadata,
}

/// Shared handle to the current corpus
///
/// Readers take cheap `Arc` snapshots; rebuilds serialize on a separate
/// gate so concurrent reload requests cannot embed the same glossary twice,
/// and never block readers while embedding runs.
#[derive(Debug, Default)]
pub struct CorpusState {
    current: RwLock<Option<Arc<LoadedCorpus>>>,
    rebuild_gate: tokio::sync::Mutex<()>,
}

impl CorpusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current corpus, if one is installed
    pub async fn snapshot(&self) -> Option<Arc<LoadedCorpus>> {
        self.current.read().await.clone()
    }

    /// Install a built corpus, replacing any previous one
    pub async fn install(&self, corpus: LoadedCorpus) {
        let mut guard = self.current.write().await;
        *guard = Some(Arc::new(corpus));
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn entry_count(&self) -> usize {
        self.current
            .read()
            .await
            .as_ref()
            .map(|c| c.index.len())
            .unwrap_or(0)
    }

    pub async fn metadata(&self) -> Option<CorpusMetadata> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|c| c.metadata.clone())
    }

    /// Rebuild the corpus from a glossary CSV and install the result
    ///
    /// Embeds entries in batches, charging each batch to the ledger. The
    /// previous corpus keeps serving until the new one is fully built.
    /// Persistence is best effort: a failed save is logged, not fatal.
    pub async fn rebuild(
        &self,
        glossary_path: &Path,
        embedder: &dyn EmbeddingBackend,
        ledger: &CostLedger,
        store: Option<&CorpusStore>,
    ) -> Result<usize, BuildError> {
        let _gate = self.rebuild_gate.lock().await;

        let entries = load_csv(glossary_path)?;
        let index = build_index(&entries, embedder, ledger).await?;
        let entry_count = index.len();

        let metadata = CorpusMetadata {
            created_at: Utc::now(),
            entry_count,
            source_name: glossary_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| glossary_path.display().to_string()),
        };

        if let Some(store) = store {
            if let Err(e) = store.save(&index, &metadata) {
                tracing::warn!("Failed to persist rebuilt corpus: {}", e);
            }
        }

        self.install(LoadedCorpus { index, metadata }).await;
        tracing::info!(entries = entry_count, "Corpus rebuilt and installed");
        Ok(entry_count)
    }
}

/// Embed cleaned entries and assemble the index
async fn build_index(
    entries: &[ReferenceEntry],
    embedder: &dyn EmbeddingBackend,
    ledger: &CostLedger,
) -> Result<EmbeddingIndex, BuildError> {
    let mut index = EmbeddingIndex::new(embedder.dimension());

    for chunk in entries.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|e| e.combined.clone()).collect();
        let batch = embedder.embed_batch(&texts).await?;
        ledger.record_embedding(batch.tokens_used);

        if batch.vectors.len() != chunk.len() {
            return Err(BackendError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                chunk.len(),
                batch.vectors.len()
            ))
            .into());
        }

        for (entry, vector) in chunk.iter().zip(batch.vectors.iter()) {
            index.insert(entry.clone(), vector)?;
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EmbeddingBatch;
    use crate::govern::PricingConfig;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbedder {
        calls: AtomicUsize,
    }

    impl FixedEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingBackend for FixedEmbedder {
        fn dimension(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmbeddingBatch {
                vectors: texts.iter().map(|_| vec![0.5, 0.5, 0.0]).collect(),
                tokens_used: texts.len() as u64 * 4,
            })
        }
    }

    fn write_glossary(dir: &Path, rows: &[(&str, &str)]) -> std::path::PathBuf {
        let path = dir.join("glossary.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "english,arabic").unwrap();
        for (en, ar) in rows {
            writeln!(file, "{},{}", en, ar).unwrap();
        }
        path
    }

    #[tokio::test]
    async fn test_rebuild_installs_corpus_and_charges_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_glossary(dir.path(), &[("salt", "ملح"), ("sugar", "سكر")]);

        let state = CorpusState::new();
        let embedder = FixedEmbedder::new();
        let ledger = CostLedger::new(PricingConfig::default());

        assert!(!state.is_loaded().await);
        let count = state.rebuild(&path, &embedder, &ledger, None).await.unwrap();
        assert_eq!(count, 2);
        assert!(state.is_loaded().await);
        assert_eq!(state.entry_count().await, 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

        let snap = ledger.snapshot();
        assert_eq!(snap.embedding_tokens, 8);
        assert_eq!(snap.embedding_calls, 1);
    }

    #[tokio::test]
    async fn test_rebuild_persists_when_store_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_glossary(dir.path(), &[("salt", "ملح")]);
        let store = CorpusStore::new(dir.path().join("data"));

        let state = CorpusState::new();
        let embedder = FixedEmbedder::new();
        let ledger = CostLedger::new(PricingConfig::default());

        state
            .rebuild(&path, &embedder, &ledger, Some(&store))
            .await
            .unwrap();
        assert!(store.exists());

        let (index, meta) = store.load().unwrap().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(meta.source_name, "glossary.csv");
    }

    #[tokio::test]
    async fn test_snapshot_survives_reinstall() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_glossary(dir.path(), &[("salt", "ملح")]);

        let state = CorpusState::new();
        let embedder = FixedEmbedder::new();
        let ledger = CostLedger::new(PricingConfig::default());

        state.rebuild(&path, &embedder, &ledger, None).await.unwrap();
        let snapshot = state.snapshot().await.unwrap();

        let path2 = write_glossary(dir.path(), &[("a", "أ"), ("b", "ب"), ("c", "ج")]);
        state.rebuild(&path2, &embedder, &ledger, None).await.unwrap();

        // Old snapshot still readable after the swap
        assert_eq!(snapshot.index.len(), 1);
        assert_eq!(state.entry_count().await, 3);
    }
}
