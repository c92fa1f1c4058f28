//! Brute-force embedding index over glossary entries
//!
//! Vectors are stored contiguously in insertion order; the row index of a
//! search hit maps back to the entry that produced it. Search computes
//! squared Euclidean distance against every stored vector, ties broken by
//! lower row index (first inserted wins).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single glossary entry held by the index
///
/// Immutable once indexed; a corpus reload replaces the whole index rather
/// than mutating entries in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Source-language text
    pub source: String,
    /// Target-language text
    pub target: String,
    /// Combined searchable text, embedded at build time
    pub combined: String,
}

impl ReferenceEntry {
    /// Create an entry, deriving the combined searchable text
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        let combined = format!("{} | {}", source, target);
        Self {
            source,
            target,
            combined,
        }
    }
}

/// A search result: row index into the index plus squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Row index of the matching entry (insertion order)
    pub row: usize,
    /// Squared Euclidean distance to the query vector
    pub distance: f32,
}

/// Brute-force vector index
///
/// Invariant: `vectors.len() == entries.len() * dimension`; every stored
/// vector has exactly `dimension` components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    dimension: usize,
    entries: Vec<ReferenceEntry>,
    /// Row-major flat storage of all embeddings
    vectors: Vec<f32>,
}

impl EmbeddingIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Vector dimension this index was built for
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the entry at a row index
    pub fn entry(&self, row: usize) -> Option<&ReferenceEntry> {
        self.entries.get(row)
    }

    /// All indexed entries, in insertion order
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Append an entry with its embedding, returning its row index
    pub fn insert(&mut self, entry: ReferenceEntry, vector: &[f32]) -> Result<usize, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }

        let row = self.entries.len();
        self.entries.push(entry);
        self.vectors.extend_from_slice(vector);
        Ok(row)
    }

    /// Find the `k` nearest entries to the query vector
    ///
    /// Returns hits sorted by non-decreasing distance; `k` larger than the
    /// corpus returns the whole corpus. Fails with [`IndexError::EmptyIndex`]
    /// when nothing has been indexed.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| SearchHit {
                row,
                distance: squared_l2(query, vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.row.cmp(&b.row))
        });
        hits.truncate(k);

        Ok(hits)
    }
}

/// Squared Euclidean distance between two equal-length vectors
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Errors from index operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Search attempted before any entry was indexed
    #[error("search attempted on an empty index")]
    EmptyIndex,

    /// Vector length does not match the index dimension
    #[error("vector dimension {got} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> EmbeddingIndex {
        let mut index = EmbeddingIndex::new(3);
        index
            .insert(
                ReferenceEntry::new("chicken breast", "صدر دجاج"),
                &[1.0, 0.0, 0.0],
            )
            .unwrap();
        index
            .insert(ReferenceEntry::new("salt", "ملح"), &[0.0, 1.0, 0.0])
            .unwrap();
        index
            .insert(ReferenceEntry::new("sugar", "سكر"), &[0.0, 0.0, 1.0])
            .unwrap();
        index
    }

    #[test]
    fn test_combined_text() {
        let entry = ReferenceEntry::new("salt", "ملح");
        assert_eq!(entry.combined, "salt | ملح");
    }

    #[test]
    fn test_search_returns_k_sorted() {
        let index = sample_index();

        let hits = index.search(&[0.9, 0.1, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].row, 0);
        assert!(hits[0].distance <= hits[1].distance);
        assert_eq!(index.entry(hits[0].row).unwrap().source, "chicken breast");
    }

    #[test]
    fn test_search_k_larger_than_corpus() {
        let index = sample_index();

        let hits = index.search(&[0.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_tie_broken_by_row() {
        let mut index = EmbeddingIndex::new(2);
        // Two entries at the same distance from the query
        index
            .insert(ReferenceEntry::new("a", "x"), &[1.0, 0.0])
            .unwrap();
        index
            .insert(ReferenceEntry::new("b", "y"), &[0.0, 1.0])
            .unwrap();

        let hits = index.search(&[0.5, 0.5], 1).unwrap();
        assert_eq!(hits[0].row, 0);
    }

    #[test]
    fn test_search_empty_index() {
        let index = EmbeddingIndex::new(3);
        let result = index.search(&[0.0, 0.0, 0.0], 1);
        assert!(matches!(result, Err(IndexError::EmptyIndex)));
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut index = EmbeddingIndex::new(3);
        let result = index.insert(ReferenceEntry::new("a", "b"), &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let index = sample_index();
        let result = index.search(&[1.0], 1);
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_serialization_round_trip() {
        let index = sample_index();
        let bytes = bincode::serialize(&index).unwrap();
        let restored: EmbeddingIndex = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.len(), 3);
        assert_eq!(restored.dimension(), 3);
        let hits = restored.search(&[0.9, 0.1, 0.0], 1).unwrap();
        assert_eq!(restored.entry(hits[0].row).unwrap().source, "chicken breast");
    }
}
