mod common;

use std::io::Write;

use assessment_recommender::errors::IngestError;
use assessment_recommender::processing::ingest::{build_catalog, ingest_file, parse_catalog};
use assessment_recommender::processing::retriever::{CatalogIndex, normalize_score, retrieve};
use assessment_recommender::repository::CatalogReader;
use common::{HashingEmbedder, TestDb, sample_catalog};

fn write_catalog(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write catalog");
    file
}

#[test]
fn fresh_store_is_empty() {
    let db = TestDb::new();
    let repo = db.repo();

    assert_eq!(repo.count_assessments().expect("count"), 0);
    assert!(repo.last_ingested_at().expect("timestamp").is_none());
    assert!(CatalogIndex::load(&repo).expect("load").is_empty());
}

#[test]
fn ingest_file_populates_store() {
    let db = TestDb::new();
    let repo = db.repo();
    let file = write_catalog(&sample_catalog().to_string());

    let stats = ingest_file(file.path(), &HashingEmbedder, &repo).expect("ingest succeeds");

    assert_eq!(stats.accepted, 16);
    assert_eq!(repo.count_assessments().expect("count"), 16);
    assert!(repo.last_ingested_at().expect("timestamp").is_some());

    let stored = repo.list_assessments().expect("list");
    assert_eq!(stored[0].record.id, 0);
    assert_eq!(stored[0].record.name, "Core Java Entry Level");
    assert_eq!(stored[0].record.languages, "English (USA)");
    assert_eq!(stored[0].embedding.len(), HashingEmbedder::DIMENSIONS);
}

#[test]
fn querying_with_embedding_text_finds_the_record_first() {
    let db = TestDb::new();
    let repo = db.repo();
    let (assessments, _) = parse_catalog(sample_catalog()).expect("valid catalog");
    build_catalog(&assessments, &HashingEmbedder, &repo).expect("catalog stored");
    let catalog = CatalogIndex::load(&repo).expect("catalog loads");

    for assessment in &assessments {
        let candidates =
            retrieve(&HashingEmbedder, &catalog, &assessment.embedding_text, 15).expect("retrieve");

        assert_eq!(candidates[0].record_id, assessment.id, "{}", assessment.name);
        assert!(normalize_score(candidates[0].distance) > 0.99);
    }
}

#[test]
fn reingesting_unchanged_input_is_idempotent() {
    let db = TestDb::new();
    let repo = db.repo();
    let file = write_catalog(&sample_catalog().to_string());
    let query = "Java developer who collaborates with business teams";

    ingest_file(file.path(), &HashingEmbedder, &repo).expect("first ingest");
    let first = CatalogIndex::load(&repo).expect("catalog loads");
    let first_hits = retrieve(&HashingEmbedder, &first, query, 15).expect("retrieve");

    ingest_file(file.path(), &HashingEmbedder, &repo).expect("second ingest");
    let second = CatalogIndex::load(&repo).expect("catalog loads");
    let second_hits = retrieve(&HashingEmbedder, &second, query, 15).expect("retrieve");

    assert_eq!(first.len(), second.len());
    assert_eq!(repo.count_assessments().expect("count"), 16);
    assert_eq!(first_hits, second_hits);
}

#[test]
fn reingest_replaces_catalog_wholesale() {
    let db = TestDb::new();
    let repo = db.repo();
    let full = write_catalog(&sample_catalog().to_string());
    let small = write_catalog(
        r#"[{"name": "OPQ", "url": "https://example.com/opq", "test_type": "P"}]"#,
    );

    ingest_file(full.path(), &HashingEmbedder, &repo).expect("full ingest");
    ingest_file(small.path(), &HashingEmbedder, &repo).expect("small ingest");

    let stored = repo.list_assessments().expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record.name, "OPQ");
    assert_eq!(stored[0].record.description, "No description");
}

#[test]
fn non_list_catalog_fails_and_keeps_previous_store() {
    let db = TestDb::new();
    let repo = db.repo();
    let good = write_catalog(&sample_catalog().to_string());
    let bad = write_catalog(r#"{"assessments": []}"#);

    ingest_file(good.path(), &HashingEmbedder, &repo).expect("good ingest");
    let result = ingest_file(bad.path(), &HashingEmbedder, &repo);

    assert!(matches!(result, Err(IngestError::NotAList)));
    assert_eq!(repo.count_assessments().expect("count"), 16);
}

#[test]
fn malformed_json_is_rejected() {
    let db = TestDb::new();
    let repo = db.repo();
    let file = write_catalog("[{\"name\": ");

    let result = ingest_file(file.path(), &HashingEmbedder, &repo);

    assert!(matches!(result, Err(IngestError::Json(_))));
}
