//! Error types shared by the recommendation pipeline.

use thiserror::Error;

use crate::repository::RepositoryError;

/// Failure to retrieve a page for a URL query.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

/// Failure of the embedding model.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to initialize embedding model: {0}")]
    Init(String),
    #[error("failed to generate embedding: {0}")]
    Generate(String),
    #[error("embedding model returned no vector")]
    Empty,
}

/// Failure of the similarity index.
#[derive(Debug, Error)]
#[error("vector index error: {0}")]
pub struct IndexError(pub String);

/// Text generation call failed or returned unusable output.
///
/// Never leaves the annotator: it is replaced by a sentinel string.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation response contained no text")]
    EmptyResponse,
}

/// A raw distance could not be turned into a relevance score.
#[derive(Debug, Error, PartialEq)]
#[error("distance {0} is not a finite number")]
pub struct ScoreNormalizationError(pub f32);

/// Errors that terminate a recommendation request.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("query text must not be empty")]
    EmptyQuery,
    #[error("scraping error: {0}")]
    Fetch(#[from] FetchError),
    #[error("could not extract job description from {0}")]
    Extraction(String),
    #[error("vector database not initialized, run the ingest command first")]
    StoreUninitialized,
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("embedding task failed: {0}")]
    EmbeddingTask(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RecommendError {
    /// Whether the failure was caused by an unusable query rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecommendError::EmptyQuery | RecommendError::Fetch(_) | RecommendError::Extraction(_)
        )
    }
}

/// Errors raised while building the catalog.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog JSON must be a list of assessments")]
    NotAList,
    #[error("no valid assessments found in catalog")]
    Empty,
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
