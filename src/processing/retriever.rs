use std::collections::HashMap;

use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::domain::assessment::{AssessmentRecord, Recommendation, RetrievalCandidate};
use crate::errors::{IndexError, RecommendError, ScoreNormalizationError};
use crate::processing::embedding::Embedder;
use crate::repository::{CatalogReader, StoredAssessment};

/// Relevance score used when a distance cannot be normalized.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// In-memory similarity index over the catalog store.
///
/// Built once from the persisted catalog and never mutated afterwards, so
/// it can be shared between requests without locking.
pub struct CatalogIndex {
    records: Vec<AssessmentRecord>,
    positions: HashMap<i32, usize>,
    index: Option<Index>,
    dimensions: usize,
}

impl CatalogIndex {
    /// Load every stored assessment and index its embedding.
    pub fn load<R: CatalogReader>(repo: &R) -> Result<Self, RecommendError> {
        let stored = repo.list_assessments()?;
        Ok(Self::build(stored)?)
    }

    /// Index `items` with a cosine metric. Items must share one dimension.
    pub fn build(items: Vec<StoredAssessment>) -> Result<Self, IndexError> {
        let Some(dimensions) = items.first().map(|item| item.embedding.len()) else {
            return Ok(Self {
                records: Vec::new(),
                positions: HashMap::new(),
                index: None,
                dimensions: 0,
            });
        };

        let index = Index::new(&IndexOptions {
            dimensions,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            ..Default::default()
        })
        .map_err(|error| IndexError(error.to_string()))?;
        index
            .reserve(items.len())
            .map_err(|error| IndexError(error.to_string()))?;

        let mut records = Vec::with_capacity(items.len());
        let mut positions = HashMap::with_capacity(items.len());
        for item in items {
            if item.embedding.len() != dimensions {
                return Err(IndexError(format!(
                    "assessment {} has {} dimensions, expected {dimensions}",
                    item.record.id,
                    item.embedding.len()
                )));
            }
            let key = index_key(item.record.id)?;
            index
                .add(key, item.embedding.as_slice())
                .map_err(|error| IndexError(error.to_string()))?;
            positions.insert(item.record.id, records.len());
            records.push(item.record);
        }

        Ok(Self {
            records,
            positions,
            index: Some(index),
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fails when `embedder` produces vectors of a different length than the
    /// indexed ones, as happens after switching models without re-ingesting.
    pub fn ensure_compatible(&self, embedder: &dyn Embedder) -> Result<(), IndexError> {
        if self.is_empty() || embedder.dimensions() == self.dimensions {
            return Ok(());
        }
        Err(IndexError(format!(
            "catalog was embedded with {} dimensions, model produces {}",
            self.dimensions,
            embedder.dimensions()
        )))
    }

    pub fn record(&self, id: i32) -> Option<&AssessmentRecord> {
        self.positions.get(&id).map(|&position| &self.records[position])
    }

    /// Search the `n` nearest records, nearest first.
    ///
    /// Equal distances are ordered by record id so identical queries always
    /// produce identical rankings.
    pub fn search(&self, query: &[f32], n: usize) -> Result<Vec<RetrievalCandidate>, IndexError> {
        let Some(index) = self.index.as_ref() else {
            return Ok(Vec::new());
        };
        if n == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(IndexError(format!(
                "query has {} dimensions, catalog has {}",
                query.len(),
                self.dimensions
            )));
        }

        let neighbors = index
            .search(query, n)
            .map_err(|error| IndexError(error.to_string()))?;

        let mut candidates = neighbors
            .keys
            .iter()
            .zip(neighbors.distances.iter())
            .map(|(&key, &distance)| {
                i32::try_from(key)
                    .map(|record_id| RetrievalCandidate {
                        record_id,
                        distance,
                    })
                    .map_err(|_| IndexError(format!("index returned unknown key {key}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.record_id.cmp(&b.record_id))
        });
        candidates.truncate(n);

        Ok(candidates)
    }
}

fn index_key(id: i32) -> Result<u64, IndexError> {
    u64::try_from(id).map_err(|_| IndexError(format!("negative assessment id {id}")))
}

/// Embed `query_text` and return up to `n` nearest catalog records.
pub fn retrieve(
    embedder: &dyn Embedder,
    catalog: &CatalogIndex,
    query_text: &str,
    n: usize,
) -> Result<Vec<RetrievalCandidate>, RecommendError> {
    if catalog.is_empty() {
        return Err(RecommendError::StoreUninitialized);
    }

    let query_embedding = embedder.embed(query_text)?;
    Ok(catalog.search(&query_embedding, n)?)
}

/// Turn a raw distance into a relevance score in `[0, 1]`.
///
/// Assumes a cosine-derived distance (`1 - cos`, roughly `[0, 2]`). A
/// different index metric needs a different formula.
pub fn try_normalize_score(distance: f32) -> Result<f32, ScoreNormalizationError> {
    if !distance.is_finite() {
        return Err(ScoreNormalizationError(distance));
    }
    Ok((1.0 - distance.abs()).clamp(0.0, 1.0))
}

/// Best-effort variant of [`try_normalize_score`] that falls back to
/// [`NEUTRAL_SCORE`].
pub fn normalize_score(distance: f32) -> f32 {
    try_normalize_score(distance).unwrap_or_else(|error| {
        log::debug!("Using neutral relevance score: {error}");
        NEUTRAL_SCORE
    })
}

/// Join candidates with their records, dropping ids missing from the catalog.
pub fn to_recommendations(
    catalog: &CatalogIndex,
    candidates: &[RetrievalCandidate],
) -> Vec<Recommendation> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let Some(record) = catalog.record(candidate.record_id) else {
                log::warn!(
                    "Index returned assessment {} which is not in the catalog",
                    candidate.record_id
                );
                return None;
            };
            Some(Recommendation {
                record: record.clone(),
                relevance_score: normalize_score(candidate.distance),
                insight: None,
            })
        })
        .collect()
}
