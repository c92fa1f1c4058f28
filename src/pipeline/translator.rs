//! Retrieval-augmented translation pipeline
//!
//! Orchestrates a call end to end: sanitize the query, embed it, retrieve
//! the nearest glossary entries, compose a grounded prompt, call the
//! generation backend, and meter the cost. Image calls run OCR through the
//! vision backend first, then feed the extracted text into the same path.

use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use super::image::{normalize_image, ImageError, ImagePolicy};
use super::language::detect_language;
use crate::backend::{BackendError, EmbeddingBackend, GenerationBackend};
use crate::corpus::CorpusState;
use crate::govern::{CostLedger, UsageLog, UsageRecord};
use crate::index::{IndexError, SearchHit};

/// Prompt sent to the vision backend for label extraction
const OCR_PROMPT: &str = "Extract all text from this food packaging image in both Arabic and English. \
Focus on ingredient lists, nutritional information, and product descriptions. \
Return only the text, preserving line breaks and formatting.";

/// Tunables for the pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Glossary entries retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Maximum accepted query length in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// Sampling temperature for generation; low favors consistency
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token budget per generation call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub image: ImagePolicy,
}

fn default_top_k() -> usize {
    3
}

fn default_max_input_chars() -> usize {
    10_000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    500
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_input_chars: default_max_input_chars(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            image: ImagePolicy::default(),
        }
    }
}

/// Errors from pipeline calls
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotReady(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<ImageError> for PipelineError {
    fn from(e: ImageError) -> Self {
        PipelineError::InvalidInput(e.to_string())
    }
}

/// Result of a text translation call
#[derive(Debug, Clone)]
pub struct Translation {
    pub translated_text: String,
    pub detected_language: String,
    pub tokens_used: u64,
    pub cost_estimate: f64,
}

/// Result of an image translation call
#[derive(Debug, Clone)]
pub struct OcrTranslation {
    pub extracted_text: String,
    pub translated_text: String,
    pub detected_language: String,
    pub tokens_used: u64,
    pub cost_estimate: f64,
}

/// The retrieval-augmented translation pipeline
pub struct Translator {
    embedder: Arc<dyn EmbeddingBackend>,
    generator: Arc<dyn GenerationBackend>,
    corpus: Arc<CorpusState>,
    ledger: Arc<CostLedger>,
    usage: Arc<UsageLog>,
    config: PipelineConfig,
}

impl Translator {
    pub fn new(
        embedder: Arc<dyn EmbeddingBackend>,
        generator: Arc<dyn GenerationBackend>,
        corpus: Arc<CorpusState>,
        ledger: Arc<CostLedger>,
        usage: Arc<UsageLog>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            generator,
            corpus,
            ledger,
            usage,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Translate a text query against the loaded glossary
    pub async fn translate(&self, text: &str) -> Result<Translation, PipelineError> {
        let query = self.sanitize(text)?;

        // Readiness first: no backend call is wasted on an unloadable corpus
        let corpus = self
            .corpus
            .snapshot()
            .await
            .ok_or_else(|| PipelineError::NotReady("Glossary not loaded".to_string()))?;

        let (query_vector, embed_tokens) = self.embed_query(&query).await?;

        let hits = match corpus.index.search(&query_vector, self.config.top_k) {
            Ok(hits) => hits,
            Err(IndexError::EmptyIndex) => {
                return Err(PipelineError::NotReady("Glossary not loaded".to_string()))
            }
            Err(e) => return Err(PipelineError::InvalidInput(e.to_string())),
        };

        let prompt = self.compose_prompt(&corpus, &hits, &query);

        let completion = self
            .generator
            .complete(&prompt, self.config.temperature, self.config.max_output_tokens)
            .await?;
        self.ledger.record_completion(completion.tokens_used);

        let cost = self.ledger.estimate(embed_tokens, completion.tokens_used);
        let tokens_used = embed_tokens + completion.tokens_used;
        self.record_usage("translate", tokens_used, cost);

        Ok(Translation {
            translated_text: completion.text.trim().to_string(),
            detected_language: detect_language(&query).to_string(),
            tokens_used,
            cost_estimate: cost,
        })
    }

    /// Extract text from a label image, then translate it
    pub async fn translate_image(&self, image_bytes: &[u8]) -> Result<OcrTranslation, PipelineError> {
        // Same readiness gate before any backend spend
        if !self.corpus.is_loaded().await {
            return Err(PipelineError::NotReady("Glossary not loaded".to_string()));
        }

        let jpeg = normalize_image(image_bytes, &self.config.image)?;

        let extraction = self.generator.complete_with_image(OCR_PROMPT, &jpeg).await?;
        self.ledger.record_completion(extraction.tokens_used);

        let extracted = extraction.text.trim().to_string();
        if extracted.is_empty() {
            let cost = self.ledger.estimate(0, extraction.tokens_used);
            self.record_usage("ocr", extraction.tokens_used, cost);
            return Ok(OcrTranslation {
                extracted_text: String::new(),
                translated_text: "No text detected in image".to_string(),
                detected_language: "none".to_string(),
                tokens_used: extraction.tokens_used,
                cost_estimate: cost,
            });
        }

        let translation = self.translate(&extracted).await?;
        let ocr_cost = self.ledger.estimate(0, extraction.tokens_used);
        self.record_usage("ocr", extraction.tokens_used, ocr_cost);

        Ok(OcrTranslation {
            extracted_text: extracted,
            translated_text: translation.translated_text,
            detected_language: translation.detected_language,
            tokens_used: extraction.tokens_used + translation.tokens_used,
            cost_estimate: crate::govern::round6(ocr_cost + translation.cost_estimate),
        })
    }

    /// Strip control characters, trim, and enforce length bounds
    fn sanitize(&self, text: &str) -> Result<String, PipelineError> {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();
        let trimmed = cleaned.trim();

        if trimmed.is_empty() {
            return Err(PipelineError::InvalidInput("text is empty".to_string()));
        }
        if trimmed.chars().count() > self.config.max_input_chars {
            return Err(PipelineError::InvalidInput(format!(
                "text exceeds {} characters",
                self.config.max_input_chars
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Embed the query, charging the ledger for the backend-reported tokens
    async fn embed_query(&self, query: &str) -> Result<(Vec<f32>, u64), PipelineError> {
        if query.trim().is_empty() {
            return Ok((vec![0.0; self.embedder.dimension()], 0));
        }

        let batch = self.embedder.embed_batch(&[query.to_string()]).await?;
        self.ledger.record_embedding(batch.tokens_used);

        let vector = batch
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("empty embedding batch".to_string()))?;
        Ok((vector, batch.tokens_used))
    }

    /// Numbered context block in descending relevance, then the instruction
    fn compose_prompt(
        &self,
        corpus: &crate::corpus::LoadedCorpus,
        hits: &[SearchHit],
        query: &str,
    ) -> String {
        let context: String = hits
            .iter()
            .enumerate()
            .filter_map(|(i, hit)| {
                corpus
                    .index
                    .entry(hit.row)
                    .map(|e| format!("{}. {} = {}", i + 1, e.source, e.target))
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an expert Arabic\u{2013}English food packaging translator.\n\
             Use the glossary context below to ensure consistent, regulatory-compliant translations.\n\
             \n\
             Glossary Context (most relevant matches):\n\
             {context}\n\
             \n\
             Translate the following text naturally and accurately:\n\
             \"{query}\"\n\
             \n\
             Provide only the translation (no explanation or additional text)."
        )
    }

    fn record_usage(&self, endpoint: &str, tokens: u64, cost: f64) {
        let running_total_cost = self.ledger.snapshot().total_cost;
        self.usage.record(UsageRecord {
            timestamp: chrono::Utc::now(),
            endpoint: endpoint.to_string(),
            tokens_used: tokens,
            cost,
            running_total_cost,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, EmbeddingBatch};
    use crate::corpus::{CorpusMetadata, LoadedCorpus};
    use crate::govern::PricingConfig;
    use crate::index::{EmbeddingIndex, ReferenceEntry};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockBackend {
        vectors: HashMap<String, Vec<f32>>,
        reply: String,
        last_prompt: Mutex<Option<String>>,
        embed_calls: AtomicUsize,
    }

    impl MockBackend {
        fn new(reply: &str) -> Self {
            let mut vectors = HashMap::new();
            vectors.insert(
                "chicken breast | صدر دجاج".to_string(),
                vec![1.0, 0.0, 0.0],
            );
            vectors.insert("salt | ملح".to_string(), vec![0.0, 1.0, 0.0]);
            vectors.insert("sugar | سكر".to_string(), vec![0.0, 0.0, 1.0]);
            vectors.insert("chicken".to_string(), vec![0.9, 0.1, 0.0]);
            Self {
                vectors,
                reply: reply.to_string(),
                last_prompt: Mutex::new(None),
                embed_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingBackend for MockBackend {
        fn dimension(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch, BackendError> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            let vectors = texts
                .iter()
                .map(|t| self.vectors.get(t).cloned().unwrap_or(vec![0.0, 0.0, 0.0]))
                .collect();
            Ok(EmbeddingBatch {
                vectors,
                tokens_used: texts.len() as u64 * 5,
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<Completion, BackendError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(Completion {
                text: format!("  {}  ", self.reply),
                tokens_used: 40,
            })
        }

        async fn complete_with_image(
            &self,
            _prompt: &str,
            _jpeg: &[u8],
        ) -> Result<Completion, BackendError> {
            Ok(Completion {
                text: self.reply.clone(),
                tokens_used: 120,
            })
        }
    }

    async fn loaded_corpus(backend: &MockBackend) -> Arc<CorpusState> {
        let mut index = EmbeddingIndex::new(3);
        for (source, target) in [
            ("chicken breast", "صدر دجاج"),
            ("salt", "ملح"),
            ("sugar", "سكر"),
        ] {
            let entry = ReferenceEntry::new(source, target);
            let vector = backend.vectors[&entry.combined].clone();
            index.insert(entry, &vector).unwrap();
        }
        let state = Arc::new(CorpusState::new());
        state
            .install(LoadedCorpus {
                index,
                metadata: CorpusMetadata {
                    created_at: chrono::Utc::now(),
                    entry_count: 3,
                    source_name: "glossary.csv".to_string(),
                },
            })
            .await;
        state
    }

    fn translator(backend: Arc<MockBackend>, corpus: Arc<CorpusState>) -> Translator {
        Translator::new(
            backend.clone(),
            backend,
            corpus,
            Arc::new(CostLedger::new(PricingConfig::default())),
            Arc::new(UsageLog::new(1000)),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_translate_grounds_prompt_in_nearest_entries() {
        let backend = Arc::new(MockBackend::new("صدر دجاج"));
        let corpus = loaded_corpus(&backend).await;
        let t = translator(backend.clone(), corpus);

        let result = t.translate("chicken").await.unwrap();
        assert_eq!(result.translated_text, "صدر دجاج");
        assert_eq!(result.detected_language, "english");
        assert_eq!(result.tokens_used, 45);
        assert!(result.cost_estimate > 0.0);

        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        // Best match leads the numbered context
        assert!(prompt.contains("1. chicken breast = صدر دجاج"));
        assert!(prompt.contains("\"chicken\""));
        assert!(prompt.contains("Provide only the translation"));
    }

    #[tokio::test]
    async fn test_translate_without_corpus_skips_backends() {
        let backend = Arc::new(MockBackend::new("x"));
        let t = translator(backend.clone(), Arc::new(CorpusState::new()));

        let result = t.translate("chicken").await;
        assert!(matches!(result, Err(PipelineError::NotReady(_))));
        assert_eq!(backend.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translate_rejects_empty_and_overlong() {
        let backend = Arc::new(MockBackend::new("x"));
        let corpus = loaded_corpus(&backend).await;
        let t = translator(backend.clone(), corpus);

        assert!(matches!(
            t.translate("   ").await,
            Err(PipelineError::InvalidInput(_))
        ));
        let long = "a".repeat(10_001);
        assert!(matches!(
            t.translate(&long).await,
            Err(PipelineError::InvalidInput(_))
        ));
        assert_eq!(backend.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_control_characters_stripped() {
        let backend = Arc::new(MockBackend::new("صدر دجاج"));
        let corpus = loaded_corpus(&backend).await;
        let t = translator(backend.clone(), corpus);

        let result = t.translate("chicken\u{0}\u{7}").await.unwrap();
        assert_eq!(result.translated_text, "صدر دجاج");

        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("\"chicken\""));
    }

    #[tokio::test]
    async fn test_usage_log_records_running_total() {
        let backend = Arc::new(MockBackend::new("ملح"));
        let corpus = loaded_corpus(&backend).await;
        let usage = Arc::new(UsageLog::new(1000));
        let t = Translator::new(
            backend.clone(),
            backend,
            corpus,
            Arc::new(CostLedger::new(PricingConfig::default())),
            usage.clone(),
            PipelineConfig::default(),
        );

        t.translate("salt").await.unwrap();
        t.translate("sugar").await.unwrap();

        let records = usage.recent(10);
        assert_eq!(records.len(), 2);
        // Running total never decreases across successive entries
        assert!(records[1].running_total_cost >= records[0].running_total_cost);
        assert_eq!(records[0].endpoint, "translate");
    }

    #[tokio::test]
    async fn test_image_empty_extraction_short_circuits() {
        let backend = Arc::new(MockBackend::new("   "));
        let corpus = loaded_corpus(&backend).await;
        let t = translator(backend.clone(), corpus);

        let img: image::ImageBuffer<image::Rgb<u8>, Vec<u8>> =
            image::ImageBuffer::from_pixel(8, 8, image::Rgb([200, 200, 200]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();

        let result = t.translate_image(&bytes.into_inner()).await.unwrap();
        assert_eq!(result.extracted_text, "");
        assert_eq!(result.translated_text, "No text detected in image");
        assert_eq!(result.detected_language, "none");
        assert_eq!(result.tokens_used, 120);
        // Extraction never reached the embedding path
        assert_eq!(backend.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_without_corpus_rejected_before_decode() {
        let backend = Arc::new(MockBackend::new("x"));
        let t = translator(backend, Arc::new(CorpusState::new()));

        let result = t.translate_image(b"not an image").await;
        assert!(matches!(result, Err(PipelineError::NotReady(_))));
    }

    #[tokio::test]
    async fn test_image_bad_bytes_invalid_input() {
        let backend = Arc::new(MockBackend::new("x"));
        let corpus = loaded_corpus(&backend).await;
        let t = translator(backend, corpus);

        let result = t.translate_image(b"not an image").await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }
}
