use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown when a catalog entry has no description.
pub const NO_DESCRIPTION: &str = "No description";
/// Placeholder shown for any other missing catalog attribute.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Raw catalog entry as produced by the catalog scraper.
///
/// Only `name` and `url` are required; entries without them are skipped at
/// ingest time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogEntry {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub languages: Option<Value>,
    #[serde(default)]
    pub job_level: Option<String>,
    #[serde(default)]
    pub remote_testing: Option<String>,
    #[serde(default)]
    pub adaptive_support: Option<String>,
    #[serde(default)]
    pub test_type: Option<String>,
}

/// Serialize a list attribute as a comma separated string.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Build the text fed to the embedder for a catalog entry.
///
/// Field order: name, description, duration, languages, job level, test
/// type, remote testing, adaptive support. Changing it invalidates every
/// stored embedding.
pub fn embedding_text(entry: &CatalogEntry) -> String {
    let languages = entry.languages.as_ref().map(stringify).unwrap_or_default();
    [
        entry.name.as_deref().unwrap_or(""),
        entry.description.as_deref().unwrap_or(""),
        entry.duration.as_deref().unwrap_or(""),
        languages.as_str(),
        entry.job_level.as_deref().unwrap_or(""),
        entry.test_type.as_deref().unwrap_or(""),
        entry.remote_testing.as_deref().unwrap_or(""),
        entry.adaptive_support.as_deref().unwrap_or(""),
    ]
    .join(" ")
}

/// Assessment ready to be written to the catalog store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessment {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub description: String,
    pub duration: String,
    pub languages: String,
    pub job_level: String,
    pub remote_testing: String,
    pub adaptive_support: String,
    pub test_type: String,
    pub embedding_text: String,
}

impl NewAssessment {
    /// Convert a catalog entry, filling display defaults for missing fields.
    ///
    /// Returns `None` when the entry lacks a name or URL.
    pub fn from_entry(id: i32, entry: &CatalogEntry) -> Option<Self> {
        let name = entry.name.clone()?;
        let url = entry.url.clone()?;
        let or_default = |value: &Option<String>| {
            value.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string())
        };

        Some(Self {
            id,
            name,
            url,
            description: entry
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            duration: or_default(&entry.duration),
            languages: entry
                .languages
                .as_ref()
                .map(stringify)
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            job_level: or_default(&entry.job_level),
            remote_testing: or_default(&entry.remote_testing),
            adaptive_support: or_default(&entry.adaptive_support),
            test_type: or_default(&entry.test_type),
            embedding_text: embedding_text(entry),
        })
    }
}

/// Immutable assessment record loaded from the catalog store.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRecord {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub description: String,
    pub duration: String,
    pub languages: String,
    pub job_level: String,
    pub remote_testing: String,
    pub adaptive_support: String,
    pub test_type: String,
    pub embedding_text: String,
}

impl AssessmentRecord {
    /// Whether the test type carries the given category code, e.g. `'K'`.
    pub fn has_test_type(&self, code: char) -> bool {
        self.test_type.contains(code)
    }
}

/// Nearest-neighbour hit for a query: record id and raw index distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalCandidate {
    pub record_id: i32,
    pub distance: f32,
}

/// A ranked record with its relevance score and optional annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub record: AssessmentRecord,
    pub relevance_score: f32,
    pub insight: Option<String>,
}

/// Externally visible form of a [`Recommendation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationView {
    pub name: String,
    pub url: String,
    pub description: String,
    pub duration: String,
    pub languages: String,
    pub job_level: String,
    pub remote_testing: String,
    pub adaptive_support: String,
    pub test_type: String,
    pub relevance_score: f32,
    pub ai_insights: String,
}

impl From<Recommendation> for RecommendationView {
    fn from(value: Recommendation) -> Self {
        let record = value.record;
        Self {
            name: record.name,
            url: record.url,
            description: record.description,
            duration: record.duration,
            languages: record.languages,
            job_level: record.job_level,
            remote_testing: record.remote_testing,
            adaptive_support: record.adaptive_support,
            test_type: record.test_type,
            relevance_score: value.relevance_score,
            ai_insights: value.insight.unwrap_or_default(),
        }
    }
}

/// Incoming recommendation request.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default = "default_use_ai")]
    pub use_ai: bool,
}

fn default_use_ai() -> bool {
    true
}

/// Response body of a recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub total_found: usize,
    pub returned: usize,
    pub recommendations: Vec<RecommendationView>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> CatalogEntry {
        serde_json::from_value(value).expect("valid entry")
    }

    #[test]
    fn embedding_text_uses_fixed_field_order() {
        let entry = entry(json!({
            "name": "Java 8",
            "url": "https://example.com/java-8",
            "description": "Core Java",
            "duration": "30 minutes",
            "languages": ["English", "German"],
            "job_level": "Mid-Professional",
            "test_type": "K",
            "remote_testing": "Yes",
            "adaptive_support": "No"
        }));

        assert_eq!(
            embedding_text(&entry),
            "Java 8 Core Java 30 minutes English, German Mid-Professional K Yes No"
        );
    }

    #[test]
    fn missing_fields_get_display_defaults() {
        let entry = entry(json!({"name": "OPQ", "url": "https://example.com/opq"}));

        let assessment = NewAssessment::from_entry(3, &entry).expect("complete entry");

        assert_eq!(assessment.id, 3);
        assert_eq!(assessment.description, NO_DESCRIPTION);
        assert_eq!(assessment.languages, NOT_SPECIFIED);
        assert_eq!(assessment.test_type, NOT_SPECIFIED);
        assert_eq!(assessment.embedding_text, "OPQ       ");
    }

    #[test]
    fn entries_without_name_or_url_are_rejected() {
        let no_url = entry(json!({"name": "OPQ"}));
        let no_name = entry(json!({"url": "https://example.com/opq"}));

        assert!(NewAssessment::from_entry(0, &no_url).is_none());
        assert!(NewAssessment::from_entry(0, &no_name).is_none());
    }

    #[test]
    fn request_enables_ai_by_default() {
        let request: QueryRequest =
            serde_json::from_value(json!({"text": "java"})).expect("valid request");

        assert!(request.use_ai);
    }

    #[test]
    fn view_uses_empty_insight_when_absent() {
        let record = AssessmentRecord {
            id: 1,
            name: "Java 8".to_string(),
            url: "https://example.com/java-8".to_string(),
            description: "Core Java".to_string(),
            duration: "30".to_string(),
            languages: "English".to_string(),
            job_level: "Entry".to_string(),
            remote_testing: "Yes".to_string(),
            adaptive_support: "No".to_string(),
            test_type: "K".to_string(),
            embedding_text: "Java 8".to_string(),
        };

        let view = RecommendationView::from(Recommendation {
            record,
            relevance_score: 0.75,
            insight: None,
        });

        assert_eq!(view.ai_insights, "");
        assert_eq!(view.relevance_score, 0.75);
    }
}
