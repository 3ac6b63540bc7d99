use std::sync::Arc;

use crate::crawlers::PageFetcher;
use crate::domain::assessment::{QueryRequest, QueryResponse, RecommendationView};
use crate::errors::RecommendError;
use crate::processing::balancer::balance;
use crate::processing::embedding::Embedder;
use crate::processing::insight::{InsightAnnotator, TextGenerator};
use crate::processing::query::{normalize_query, truncate_for_display};
use crate::processing::retriever::{CatalogIndex, to_recommendations};

/// Candidates fetched from the index before balancing.
pub const DEFAULT_CANDIDATE_COUNT: usize = 15;

/// The query-to-ranked-list pipeline.
///
/// Every collaborator is constructed once at startup and shared; nothing
/// here is mutated while serving.
pub struct Recommender {
    catalog: Arc<CatalogIndex>,
    embedder: Arc<dyn Embedder>,
    fetcher: Arc<dyn PageFetcher>,
    generator: Option<Arc<dyn TextGenerator>>,
    candidate_count: usize,
}

impl Recommender {
    pub fn new(
        catalog: Arc<CatalogIndex>,
        embedder: Arc<dyn Embedder>,
        fetcher: Arc<dyn PageFetcher>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            catalog,
            embedder,
            fetcher,
            generator,
            candidate_count: DEFAULT_CANDIDATE_COUNT,
        }
    }

    pub fn with_candidate_count(mut self, candidate_count: usize) -> Self {
        self.candidate_count = candidate_count.max(1);
        self
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    /// Whether a text generation client was initialized.
    pub fn generator_available(&self) -> bool {
        self.generator.is_some()
    }

    /// Produce ranked, balanced and optionally annotated recommendations.
    ///
    /// Only unusable queries and an empty catalog fail the request;
    /// annotation and scoring problems degrade to defaults.
    pub async fn recommend(&self, request: &QueryRequest) -> Result<QueryResponse, RecommendError> {
        if self.catalog.is_empty() {
            return Err(RecommendError::StoreUninitialized);
        }

        let query_text = normalize_query(&request.text, self.fetcher.as_ref()).await?;
        let query_embedding = self.embed_query(&query_text).await?;
        let candidates = self
            .catalog
            .search(&query_embedding, self.candidate_count)?;
        let total_found = candidates.len();

        let ranked = to_recommendations(&self.catalog, &candidates);
        let mut recommendations = balance(ranked, &request.text);

        if request.use_ai {
            InsightAnnotator::new(self.generator.as_deref())
                .annotate(&mut recommendations)
                .await;
        }

        log::info!(
            "Recommended {} of {total_found} candidates (use_ai={})",
            recommendations.len(),
            request.use_ai
        );

        Ok(QueryResponse {
            query: truncate_for_display(&query_text),
            total_found,
            returned: recommendations.len(),
            recommendations: recommendations
                .into_iter()
                .map(RecommendationView::from)
                .collect(),
        })
    }

    /// Model inference is CPU bound, so it runs on the blocking pool.
    async fn embed_query(&self, query_text: &str) -> Result<Vec<f32>, RecommendError> {
        let embedder = Arc::clone(&self.embedder);
        let text = query_text.to_string();
        let embedding = tokio::task::spawn_blocking(move || embedder.embed(&text)).await??;
        Ok(embedding)
    }
}
