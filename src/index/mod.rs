//! Embedding Index
//!
//! Fixed-dimension vector storage with brute-force nearest-neighbor search.
//! Corpus sizes are small (hundreds to low thousands of entries), so an
//! exhaustive scan is as fast as an approximate index and much simpler.
//! A larger deployment can substitute an ANN structure behind the same
//! contract without touching callers.

pub mod embedding_index;

pub use embedding_index::{EmbeddingIndex, IndexError, ReferenceEntry, SearchHit};
