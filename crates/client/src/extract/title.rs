//! HTML title extraction.

use scraper::{Html, Selector};

/// Extract the text of the first `<title>` element with non-empty
/// trimmed content, or `None` if the document has no such element.
///
/// The document is scanned whole; error pages and redirect landing pages
/// are treated no differently from ordinary ones.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").expect("invalid selector");

    for element in document.select(&selector) {
        let text = element.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }

    None
}
