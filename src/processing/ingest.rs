use std::path::Path;

use serde_json::Value;

use crate::domain::assessment::{CatalogEntry, NewAssessment};
use crate::errors::IngestError;
use crate::processing::embedding::Embedder;
use crate::repository::CatalogWriter;

/// Records embedded per model call.
const EMBED_BATCH_SIZE: usize = 100;
/// Progress is logged every this many records.
const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Default, PartialEq)]
pub struct IngestStats {
    pub received: usize,
    pub accepted: usize,
    pub skipped_invalid: usize,
    pub skipped_incomplete: usize,
}

/// Validate a parsed catalog and convert it to storable assessments.
///
/// The top-level value must be a list. Items that are not objects, fail to
/// parse, or lack `name`/`url` are skipped.
pub fn parse_catalog(value: Value) -> Result<(Vec<NewAssessment>, IngestStats), IngestError> {
    let Value::Array(items) = value else {
        return Err(IngestError::NotAList);
    };

    let mut stats = IngestStats {
        received: items.len(),
        ..Default::default()
    };
    let mut assessments = Vec::with_capacity(items.len());

    for (position, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            log::warn!("Skipping invalid item at index {position}");
            stats.skipped_invalid += 1;
            continue;
        }
        let entry: CatalogEntry = match serde_json::from_value(item) {
            Ok(entry) => entry,
            Err(error) => {
                log::warn!("Skipping malformed item at index {position}: {error}");
                stats.skipped_invalid += 1;
                continue;
            }
        };

        let id = assessments.len() as i32;
        match NewAssessment::from_entry(id, &entry) {
            Some(assessment) => assessments.push(assessment),
            None => {
                log::warn!("Skipping incomplete item at index {position}");
                stats.skipped_incomplete += 1;
            }
        }
    }

    stats.accepted = assessments.len();
    if assessments.is_empty() {
        return Err(IngestError::Empty);
    }

    Ok((assessments, stats))
}

/// Embed `assessments` and replace the stored catalog with them.
pub fn build_catalog<W: CatalogWriter>(
    assessments: &[NewAssessment],
    embedder: &dyn Embedder,
    repo: &W,
) -> Result<usize, IngestError> {
    let mut embeddings = Vec::with_capacity(assessments.len());
    for batch in assessments.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|a| a.embedding_text.clone()).collect();
        embeddings.extend(embedder.embed_batch(&texts)?);

        let done = embeddings.len();
        if done / PROGRESS_EVERY > (done - batch.len()) / PROGRESS_EVERY || done == assessments.len()
        {
            log::info!("Embedded {done}/{} assessments", assessments.len());
        }
    }

    Ok(repo.replace_catalog(assessments, &embeddings)?)
}

/// Full ingest: read `path`, validate, embed and store.
pub fn ingest_file<W: CatalogWriter>(
    path: &Path,
    embedder: &dyn Embedder,
    repo: &W,
) -> Result<IngestStats, IngestError> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    log::info!("Loaded catalog from {}", path.display());

    let (assessments, stats) = parse_catalog(value)?;
    let stored = build_catalog(&assessments, embedder, repo)?;

    log::info!(
        "Finished catalog ingest: received={}, accepted={}, stored={stored}, skipped_invalid={}, skipped_incomplete={}",
        stats.received,
        stats.accepted,
        stats.skipped_invalid,
        stats.skipped_incomplete
    );
    Ok(stats)
}
