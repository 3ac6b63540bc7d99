pub mod balancer;
pub mod embedding;
pub mod evaluation;
pub mod ingest;
pub mod insight;
pub mod query;
pub mod recommender;
pub mod retriever;
