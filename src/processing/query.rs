use crate::crawlers::PageFetcher;
use crate::crawlers::job_description::extract_description;
use crate::errors::RecommendError;

/// Characters of the query echoed back in a response.
pub const QUERY_ECHO_CHARS: usize = 200;

/// Whether `input` should be scraped rather than embedded directly.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Turn raw user input into the text handed to the embedder.
///
/// URLs are fetched and reduced to their job description block; anything
/// else passes through trimmed.
pub async fn normalize_query(
    input: &str,
    fetcher: &dyn PageFetcher,
) -> Result<String, RecommendError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(RecommendError::EmptyQuery);
    }
    if !is_url(input) {
        return Ok(input.to_string());
    }

    log::info!("Scraping job description from {input}");
    let html = fetcher.fetch(input).await?;
    extract_description(&html).ok_or_else(|| {
        log::warn!("No job description block found at {input}");
        RecommendError::Extraction(input.to_string())
    })
}

/// Shorten a query for echoing back to the caller.
pub fn truncate_for_display(query: &str) -> String {
    match query.char_indices().nth(QUERY_ECHO_CHARS) {
        Some((cut, _)) => format!("{}...", &query[..cut]),
        None => query.to_string(),
    }
}
