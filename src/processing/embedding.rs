use std::str::FromStr;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::errors::EmbeddingError;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic: identical input yields an
/// identical vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, preserving input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimensions(&self) -> usize;
}

/// Sentence embedding models the service can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceModel {
    AllMiniLmL6V2,
    BgeSmallEnV15,
    MultilingualE5Large,
}

impl SentenceModel {
    pub fn dimensions(self) -> usize {
        match self {
            SentenceModel::AllMiniLmL6V2 | SentenceModel::BgeSmallEnV15 => 384,
            SentenceModel::MultilingualE5Large => 1024,
        }
    }

    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            SentenceModel::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            SentenceModel::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            SentenceModel::MultilingualE5Large => EmbeddingModel::MultilingualE5Large,
        }
    }
}

impl FromStr for SentenceModel {
    type Err = EmbeddingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "all-minilm-l6-v2" => Ok(SentenceModel::AllMiniLmL6V2),
            "bge-small-en-v1.5" => Ok(SentenceModel::BgeSmallEnV15),
            "multilingual-e5-large" => Ok(SentenceModel::MultilingualE5Large),
            other => Err(EmbeddingError::Init(format!(
                "unsupported embedding model {other}"
            ))),
        }
    }
}

/// [`Embedder`] backed by a local fastembed ONNX model.
///
/// The model is loaded once; fastembed needs exclusive access per call so
/// it sits behind a mutex.
pub struct FastTextEmbedder {
    model: Mutex<TextEmbedding>,
    dimensions: usize,
}

impl FastTextEmbedder {
    pub fn new(model: SentenceModel) -> Result<Self, EmbeddingError> {
        let embedding = TextEmbedding::try_new(InitOptions::new(model.fastembed_model()))
            .map_err(|error| EmbeddingError::Init(format!("{error:?}")))?;
        log::info!("Loaded embedding model {model:?}");
        Ok(Self {
            model: Mutex::new(embedding),
            dimensions: model.dimensions(),
        })
    }
}

impl Embedder for FastTextEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::Empty)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::Generate("embedding model lock poisoned".to_string()))?;
        let generated = model
            .embed(texts.to_vec(), None)
            .map_err(|error| EmbeddingError::Generate(format!("{error:?}")))?;
        if generated.len() != texts.len() {
            return Err(EmbeddingError::Empty);
        }

        Ok(generated
            .into_iter()
            .map(|value| normalize_embedding(&value))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}
