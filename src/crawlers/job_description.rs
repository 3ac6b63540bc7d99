use scraper::{ElementRef, Html, Selector};

/// Selectors tried in order when looking for a job description block.
const DESCRIPTION_SELECTORS: &[&str] = &[
    "div.job-description",
    "section.description",
    "div[class*='description']",
    "div[id*='description']",
];

/// Element text with runs of whitespace collapsed to single spaces.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the job description from an HTML page.
///
/// Selectors are tried in order and only the first element each one matches
/// is considered; the first non-empty text wins.
pub fn extract_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    DESCRIPTION_SELECTORS.iter().find_map(|raw| {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(error) => {
                log::error!("Invalid description selector {raw}: {error:?}");
                return None;
            }
        };
        document
            .select(&selector)
            .next()
            .map(collapsed_text)
            .filter(|text| !text.is_empty())
    })
}
