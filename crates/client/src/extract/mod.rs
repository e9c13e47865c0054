//! URL extraction from free text.
//!
//! Scans raw text for candidate URLs using one of two grammars:
//!
//! - **Strict** (default): requires an explicit `http://` or `https://`
//!   scheme and an authority that `url::Url` accepts.
//! - **Relaxed**: additionally matches scheme-less domain-like tokens
//!   such as `example.com/path`.
//!
//! Output preserves order of first appearance and performs no
//! deduplication: a URL that occurs twice in the source yields two
//! records. Extraction over readable text never fails; reading the
//! source is the caller's problem.

pub mod title;

pub use title::extract_title;

use std::sync::LazyLock;

use regex::Regex;

/// URL-matching strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlGrammar {
    #[default]
    Strict,
    Relaxed,
}

/// An extracted URL.
///
/// `raw` is the exact matched text and serves as identity for cache keys
/// and rendering. `normalized` is `raw` with an `https://` scheme
/// prepended when the relaxed grammar matched a scheme-less token; it is
/// what the fetchers actually request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub raw: String,
    pub normalized: String,
}

static STRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`]+"#).expect("invalid strict URL regex"));

static RELAXED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'`]+|(?:[A-Za-z0-9][A-Za-z0-9-]*\.)+[A-Za-z]{2,}(?::\d+)?(?:/[^\s<>"'`]*)?"#)
        .expect("invalid relaxed URL regex")
});

/// Extract URLs from text using the given grammar.
///
/// Returns matches in order of first appearance, duplicates preserved.
pub fn extract_urls(text: &str, grammar: UrlGrammar) -> Vec<UrlRecord> {
    let re: &Regex = match grammar {
        UrlGrammar::Strict => &STRICT_RE,
        UrlGrammar::Relaxed => &RELAXED_RE,
    };

    let mut records = Vec::new();
    for m in re.find_iter(text) {
        // Skip the domain part of e-mail addresses.
        if m.start() > 0 && text.as_bytes()[m.start() - 1] == b'@' {
            continue;
        }

        let matched = trim_trailing_punctuation(m.as_str());
        if matched.is_empty() {
            continue;
        }

        let record = if matched.contains("://") {
            match url::Url::parse(matched) {
                Ok(parsed) if parsed.host_str().is_some() => {
                    UrlRecord { raw: matched.to_string(), normalized: matched.to_string() }
                }
                _ => {
                    tracing::trace!(matched, "rejected malformed URL candidate");
                    continue;
                }
            }
        } else {
            let with_scheme = format!("https://{matched}");
            match url::Url::parse(&with_scheme) {
                Ok(parsed) if parsed.host_str().is_some() => {
                    UrlRecord { raw: matched.to_string(), normalized: with_scheme }
                }
                _ => {
                    tracing::trace!(matched, "rejected malformed domain candidate");
                    continue;
                }
            }
        };

        records.push(record);
    }

    tracing::debug!(count = records.len(), ?grammar, "URLs extracted");
    records
}

/// Strip punctuation that belongs to the surrounding prose, not the URL.
///
/// Sentence punctuation is always stripped; a closing bracket only when
/// the match does not contain its opening counterpart.
fn trim_trailing_punctuation(s: &str) -> &str {
    let mut end = s.len();
    loop {
        let trimmed = &s[..end];
        let Some(last) = trimmed.chars().last() else { break };
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' => true,
            ')' => trimmed.matches(')').count() > trimmed.matches('(').count(),
            ']' => trimmed.matches(']').count() > trimmed.matches('[').count(),
            '}' => trimmed.matches('}').count() > trimmed.matches('{').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raws(records: &[UrlRecord]) -> Vec<&str> {
        records.iter().map(|r| r.raw.as_str()).collect()
    }

    #[test]
    fn test_strict_basic() {
        let records = extract_urls("see https://example.com/a for details", UrlGrammar::Strict);
        assert_eq!(raws(&records), vec!["https://example.com/a"]);
        assert_eq!(records[0].normalized, "https://example.com/a");
    }

    #[test]
    fn test_strict_rejects_bare_domain() {
        let records = extract_urls("see example.com/a for details", UrlGrammar::Strict);
        assert!(records.is_empty());
    }

    #[test]
    fn test_relaxed_matches_bare_domain() {
        let records = extract_urls("see example.com/a for details", UrlGrammar::Relaxed);
        assert_eq!(raws(&records), vec!["example.com/a"]);
        assert_eq!(records[0].normalized, "https://example.com/a");
    }

    #[test]
    fn test_relaxed_keeps_explicit_scheme() {
        let records = extract_urls("http://example.com and sub.example.org", UrlGrammar::Relaxed);
        assert_eq!(raws(&records), vec!["http://example.com", "sub.example.org"]);
        assert_eq!(records[0].normalized, "http://example.com");
        assert_eq!(records[1].normalized, "https://sub.example.org");
    }

    #[test]
    fn test_duplicates_preserved_in_order() {
        let records = extract_urls(
            "see https://example.com/a and https://example.com/a again",
            UrlGrammar::Strict,
        );
        assert_eq!(raws(&records), vec!["https://example.com/a", "https://example.com/a"]);
    }

    #[test]
    fn test_order_of_first_appearance() {
        let records = extract_urls("https://b.example then https://a.example", UrlGrammar::Strict);
        assert_eq!(raws(&records), vec!["https://b.example", "https://a.example"]);
    }

    #[test]
    fn test_no_urls_yields_empty() {
        let records = extract_urls("nothing to see here", UrlGrammar::Strict);
        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_urls("", UrlGrammar::Relaxed).is_empty());
    }

    #[test]
    fn test_trailing_sentence_punctuation_stripped() {
        let records = extract_urls("read https://example.com/a.", UrlGrammar::Strict);
        assert_eq!(raws(&records), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_unbalanced_paren_stripped() {
        let records = extract_urls("(see https://example.com/a)", UrlGrammar::Strict);
        assert_eq!(raws(&records), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_balanced_paren_kept() {
        let records = extract_urls("https://en.wikipedia.org/wiki/Foo_(bar)", UrlGrammar::Strict);
        assert_eq!(raws(&records), vec!["https://en.wikipedia.org/wiki/Foo_(bar)"]);
    }

    #[test]
    fn test_query_string_preserved() {
        let records = extract_urls("https://example.com/p?a=1&b=2 end", UrlGrammar::Strict);
        assert_eq!(raws(&records), vec!["https://example.com/p?a=1&b=2"]);
    }

    #[test]
    fn test_email_domain_not_matched() {
        let records = extract_urls("mail me at someone@example.com please", UrlGrammar::Relaxed);
        assert!(records.is_empty());
    }

    #[test]
    fn test_relaxed_on_mixed_text() {
        let text = "docs at docs.rs/regex, source https://github.com/rust-lang/regex.";
        let records = extract_urls(text, UrlGrammar::Relaxed);
        assert_eq!(raws(&records), vec!["docs.rs/regex", "https://github.com/rust-lang/regex"]);
    }

    #[test]
    fn test_default_grammar_is_strict() {
        assert_eq!(UrlGrammar::default(), UrlGrammar::Strict);
    }
}
