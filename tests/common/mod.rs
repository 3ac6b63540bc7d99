//! Helpers for integration tests.
#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use assessment_recommender::crawlers::PageFetcher;
use assessment_recommender::errors::{AnnotationError, EmbeddingError, FetchError};
use assessment_recommender::processing::embedding::{Embedder, normalize_embedding};
use assessment_recommender::processing::insight::TextGenerator;
use assessment_recommender::processing::recommender::Recommender;
use assessment_recommender::processing::retriever::CatalogIndex;
use assessment_recommender::repository::{DbPool, DieselRepository, establish_connection_pool};

/// Temporary SQLite database used in integration tests.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir.");
        let path = dir.path().join("catalog.db");
        let pool = establish_connection_pool(path.to_str().expect("utf-8 temp path"))
            .expect("Failed to establish SQLite connection.");
        TestDb { _dir: dir, pool }
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool.clone()).expect("Failed to prepare catalog table.")
    }
}

/// Deterministic bag-of-words embedder: every lowercase token is hashed into
/// one of `DIMENSIONS` buckets.
pub struct HashingEmbedder;

impl HashingEmbedder {
    pub const DIMENSIONS: usize = 64;
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0_f32; Self::DIMENSIONS];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            vector[(hasher.finish() % Self::DIMENSIONS as u64) as usize] += 1.0;
        }
        // Keeps empty text away from the zero vector.
        vector[0] += 0.01;
        Ok(normalize_embedding(&vector))
    }

    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }
}

/// [`HashingEmbedder`] that holds its thread for `delay` on every call.
pub struct SlowEmbedder {
    pub delay: Duration,
}

impl Embedder for SlowEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        std::thread::sleep(self.delay);
        HashingEmbedder.embed(text)
    }

    fn dimensions(&self) -> usize {
        HashingEmbedder::DIMENSIONS
    }
}

/// Generator that counts calls and answers with a fixed reply or fails.
pub struct CountingGenerator {
    reply: Option<&'static str>,
    calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn replying(reply: &'static str) -> Self {
        Self {
            reply: Some(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AnnotationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Some(reply) => Ok(reply.to_string()),
            None => Err(AnnotationError::Status {
                status: 429,
                body: "quota exceeded".to_string(),
            }),
        }
    }
}

/// Fetcher serving one static HTML page, or failing with a status code.
pub struct StaticPageFetcher {
    page: Result<String, u16>,
    calls: AtomicUsize,
}

impl StaticPageFetcher {
    pub fn page(html: &str) -> Self {
        Self {
            page: Ok(html.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            page: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.page.clone().map_err(|status| FetchError::Status {
            url: url.to_string(),
            status,
        })
    }
}

pub fn assessment(name: &str, description: &str, test_type: &str) -> Value {
    let slug = name.to_lowercase().replace(' ', "-");
    json!({
        "name": name,
        "url": format!("https://www.example.com/products/product-catalog/view/{slug}/"),
        "description": description,
        "duration": "30 minutes",
        "languages": ["English (USA)"],
        "job_level": "Mid-Professional",
        "remote_testing": "Yes",
        "adaptive_support": "No",
        "test_type": test_type
    })
}

/// Catalog mixing knowledge (K), personality (P) and ability (A) assessments.
pub fn sample_catalog() -> Value {
    Value::Array(vec![
        assessment("Core Java Entry Level", "Java programming fundamentals for developers", "K"),
        assessment("Core Java Advanced", "Advanced Java developer knowledge test", "K"),
        assessment("Java Frameworks", "Spring and Hibernate for Java developers", "K"),
        assessment("Java Design Patterns", "Design patterns for Java software developers", "K"),
        assessment("Java 8 Streams", "Functional Java for developers", "K"),
        assessment("Java Web Services", "REST services built by Java developers", "K"),
        assessment("Java Concurrency", "Threads and locks for senior Java developers", "K"),
        assessment("SQL Server", "Relational databases for developers", "K"),
        assessment("Occupational Personality Questionnaire", "Personality at work, teams and business collaboration", "P"),
        assessment("Teamwork Styles", "How a person collaborates with business teams", "P"),
        assessment("Business Communication", "Written communication with business teams", "P"),
        assessment("Motivation Questionnaire", "What motivates a person who works with teams", "P"),
        assessment("Leadership Report", "Leadership and collaboration with teams", "P"),
        assessment("Verify Numerical Reasoning", "Numerical ability for business roles", "A"),
        assessment("Verify Inductive Reasoning", "Inductive ability for developer roles", "A"),
        assessment("Situational Judgement", "Behavioral judgement in business situations", "B"),
    ])
}

/// Recommender over an in-memory copy of whatever `repo` stores.
pub fn recommender(
    repo: &DieselRepository,
    fetcher: Arc<dyn PageFetcher>,
    generator: Option<Arc<dyn TextGenerator>>,
) -> Recommender {
    let catalog = CatalogIndex::load(repo).expect("catalog loads");
    Recommender::new(
        Arc::new(catalog),
        Arc::new(HashingEmbedder),
        fetcher,
        generator,
    )
}
