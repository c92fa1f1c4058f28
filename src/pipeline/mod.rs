//! Translation pipeline
//!
//! Query sanitization, language detection, image normalization, and the
//! retrieval-augmented orchestration that ties the corpus and backends
//! together.

pub mod image;
pub mod language;
pub mod translator;

pub use image::{normalize_image, ImageError, ImagePolicy};
pub use language::detect_language;
pub use translator::{
    OcrTranslation, PipelineConfig, PipelineError, Translation, Translator,
};
