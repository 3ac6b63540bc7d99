//! Offline Mean Recall@K against a labeled query set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::RecommendError;
use crate::processing::embedding::Embedder;
use crate::processing::retriever::{CatalogIndex, retrieve};

/// One labeled query and the catalog URLs judged relevant for it.
#[derive(Debug, Clone, Deserialize)]
pub struct LabeledQuery {
    pub query: String,
    pub relevant_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub total_queries: usize,
    pub mean_recall: f64,
    pub min_recall: f64,
    pub max_recall: f64,
    pub individual_scores: Vec<f64>,
}

/// Reduce a catalog URL to its final slug so that URLs differing only in
/// scheme, host, `/solutions/` prefix, case or trailing slash compare equal.
pub fn normalize_url(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let path = lowered.trim_end_matches('/');
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}

/// Share of `relevant` URLs found in `recommended`; `0.0` when nothing is relevant.
pub fn recall_at_k(recommended: &[String], relevant: &[String]) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let relevant_slugs: HashSet<String> = relevant.iter().map(|url| normalize_url(url)).collect();
    let matched = recommended
        .iter()
        .map(|url| normalize_url(url))
        .collect::<HashSet<_>>()
        .intersection(&relevant_slugs)
        .count();
    matched as f64 / relevant_slugs.len() as f64
}

/// Run raw retrieval with `n = k` for every labeled query.
pub fn evaluate(
    embedder: &dyn Embedder,
    catalog: &CatalogIndex,
    queries: &[LabeledQuery],
    k: usize,
) -> Result<EvaluationReport, RecommendError> {
    let mut scores = Vec::with_capacity(queries.len());
    for labeled in queries {
        let recommended: Vec<String> = retrieve(embedder, catalog, &labeled.query, k)?
            .iter()
            .filter_map(|candidate| catalog.record(candidate.record_id))
            .map(|record| record.url.clone())
            .collect();
        let recall = recall_at_k(&recommended, &labeled.relevant_urls);
        log::debug!("Recall@{k}={recall:.3} for query {:?}", labeled.query);
        scores.push(recall);
    }

    Ok(summarize(k, scores))
}

fn summarize(k: usize, scores: Vec<f64>) -> EvaluationReport {
    let total = scores.len();
    let mean = if total == 0 {
        0.0
    } else {
        scores.iter().sum::<f64>() / total as f64
    };
    EvaluationReport {
        k,
        total_queries: total,
        mean_recall: mean,
        min_recall: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
        max_recall: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
        individual_scores: scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_variants_share_a_slug() {
        let variants = [
            "https://www.shl.com/solutions/products/product-catalog/view/automata-fix-new/",
            "https://www.shl.com/products/product-catalog/view/automata-fix-new",
            "HTTP://shl.com/products/product-catalog/view/Automata-Fix-New/",
        ];

        for url in variants {
            assert_eq!(normalize_url(url), "automata-fix-new");
        }
    }

    #[test]
    fn recall_counts_slug_matches() {
        let recommended = vec![
            "https://www.shl.com/products/product-catalog/view/java-8-new/".to_string(),
            "https://www.shl.com/products/product-catalog/view/opq32r/".to_string(),
        ];
        let relevant = vec![
            "https://www.shl.com/solutions/products/product-catalog/view/java-8-new/".to_string(),
            "https://www.shl.com/solutions/products/product-catalog/view/sql-server/".to_string(),
        ];

        assert_eq!(recall_at_k(&recommended, &relevant), 0.5);
        assert_eq!(recall_at_k(&recommended, &[]), 0.0);
    }

    #[test]
    fn summary_reports_extremes() {
        let report = summarize(10, vec![0.5, 1.0, 0.0]);

        assert_eq!(report.total_queries, 3);
        assert_eq!(report.mean_recall, 0.5);
        assert_eq!(report.min_recall, 0.0);
        assert_eq!(report.max_recall, 1.0);
    }

    #[test]
    fn empty_summary_is_zero() {
        let report = summarize(5, Vec::new());

        assert_eq!(report.mean_recall, 0.0);
        assert_eq!(report.max_recall, 0.0);
    }
}
