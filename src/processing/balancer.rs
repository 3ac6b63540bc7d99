//! Category balancing between knowledge and personality assessments.

use crate::domain::assessment::Recommendation;

/// Maximum number of recommendations returned for a query.
pub const RESULT_LIMIT: usize = 10;
/// Knowledge-tagged items kept when a query asks for both skill kinds.
pub const KNOWLEDGE_TARGET: usize = 6;
/// Personality-tagged items kept when a query asks for both skill kinds.
pub const PERSONALITY_TARGET: usize = 4;

pub const KNOWLEDGE_CODE: char = 'K';
pub const PERSONALITY_CODE: char = 'P';

const TECHNICAL_KEYWORDS: &[&str] = &[
    "java",
    "python",
    "sql",
    "coding",
    "technical",
    "developer",
    "programming",
    "software",
    "engineer",
    "development",
];

// "collaborat" covers collaborate, collaborates, collaboration and collaborative.
const SOFT_KEYWORDS: &[&str] = &[
    "communication",
    "collaborat",
    "teamwork",
    "personality",
    "leadership",
    "behavioral",
    "interpersonal",
    "management",
];

fn mentions_any(query_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| query_lower.contains(keyword))
}

/// Whether the query asks for both technical and behavioral skills.
pub fn needs_mixed_categories(query: &str) -> bool {
    let query_lower = query.to_lowercase();
    mentions_any(&query_lower, TECHNICAL_KEYWORDS) && mentions_any(&query_lower, SOFT_KEYWORDS)
}

/// Re-rank `ranked` for `query`.
///
/// Mixed queries get up to six knowledge-tagged items followed by up to four
/// personality-tagged items, each group in its original order; items tagged
/// with neither code are dropped. Other queries keep the first ten items.
/// Scores are never modified.
pub fn balance(ranked: Vec<Recommendation>, query: &str) -> Vec<Recommendation> {
    if !needs_mixed_categories(query) {
        let mut ranked = ranked;
        ranked.truncate(RESULT_LIMIT);
        return ranked;
    }

    let knowledge = ranked
        .iter()
        .filter(|item| item.record.has_test_type(KNOWLEDGE_CODE))
        .take(KNOWLEDGE_TARGET)
        .cloned();
    let personality = ranked
        .iter()
        .filter(|item| item.record.has_test_type(PERSONALITY_CODE))
        .take(PERSONALITY_TARGET)
        .cloned();

    let balanced: Vec<Recommendation> = knowledge.chain(personality).take(RESULT_LIMIT).collect();
    log::debug!(
        "Balanced {} candidates into {} recommendations for a mixed query",
        ranked.len(),
        balanced.len()
    );
    balanced
}
