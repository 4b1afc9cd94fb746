//! Evidence deduplication.
//!
//! Drops citations that repeat an earlier url or title, then caps how many
//! citations one domain may contribute. First-seen order is preserved.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::fallback::tier::EvidenceCitation;

/// Comparison key for a url. Scheme and host are case-insensitive, path and
/// query are not; fragments and trailing slashes are ignored.
fn url_key(url: &str) -> String {
    let url = url.trim();
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => {
            let url = url.split('#').next().unwrap_or(url);
            url.trim_end_matches('/').to_string()
        }
    }
}

fn title_key(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Deduplicate citations and keep at most `max_per_domain` per domain.
///
/// Citations without a parseable domain are not capped.
pub fn dedup_evidence(
    citations: Vec<EvidenceCitation>,
    max_per_domain: usize,
) -> Vec<EvidenceCitation> {
    let mut seen_urls = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut per_domain: HashMap<String, usize> = HashMap::new();

    citations
        .into_iter()
        .filter(|citation| {
            let url = url_key(&citation.url);
            let title = title_key(&citation.title);
            if (!url.is_empty() && seen_urls.contains(&url))
                || (!title.is_empty() && seen_titles.contains(&title))
            {
                return false;
            }

            if let Some(domain) = &citation.domain {
                let count = per_domain.entry(domain.clone()).or_default();
                if *count >= max_per_domain {
                    return false;
                }
                *count += 1;
            }

            if !url.is_empty() {
                seen_urls.insert(url);
            }
            if !title.is_empty() {
                seen_titles.insert(title);
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cite(title: &str, url: &str) -> EvidenceCitation {
        EvidenceCitation::new(title, url)
    }

    fn urls(citations: &[EvidenceCitation]) -> Vec<&str> {
        citations.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_domain_cap_keeps_first_seen() {
        let out = dedup_evidence(
            vec![
                cite("x1", "https://x.com/1"),
                cite("y1", "https://y.org/1"),
                cite("x2", "https://x.com/2"),
                cite("x3", "https://www.x.com/3"),
                cite("y2", "https://y.org/2"),
            ],
            2,
        );
        assert_eq!(
            urls(&out),
            vec!["https://x.com/1", "https://y.org/1", "https://x.com/2", "https://y.org/2"]
        );
    }

    #[test]
    fn test_duplicate_url_or_title() {
        let out = dedup_evidence(
            vec![
                cite("Study", "https://a.com/study"),
                cite("Study (mirror)", "https://A.com/study/"),
                cite("  study ", "https://b.com/other"),
                cite("Fresh", "https://c.com/fresh#section"),
                cite("Fresh again", "https://c.com/fresh"),
            ],
            5,
        );
        assert_eq!(urls(&out), vec!["https://a.com/study", "https://c.com/fresh#section"]);
    }

    #[test]
    fn test_url_path_is_case_sensitive() {
        let out = dedup_evidence(
            vec![
                cite("Annual report", "https://x.com/Report"),
                cite("Report index", "https://x.com/report"),
                cite("Annual report, host case", "HTTPS://X.COM/Report?y=1"),
                cite("Annual report, query", "https://x.com/Report?y=1"),
            ],
            5,
        );
        assert_eq!(
            urls(&out),
            vec!["https://x.com/Report", "https://x.com/report", "HTTPS://X.COM/Report?y=1"]
        );
    }

    #[test]
    fn test_dropped_duplicates_do_not_use_domain_quota() {
        let out = dedup_evidence(
            vec![
                cite("a", "https://x.com/a"),
                cite("a", "https://x.com/a"),
                cite("b", "https://x.com/b"),
            ],
            2,
        );
        assert_eq!(urls(&out), vec!["https://x.com/a", "https://x.com/b"]);
    }

    #[test]
    fn test_unparseable_urls_are_not_capped() {
        let out = dedup_evidence(
            vec![cite("one", "n/a 1"), cite("two", "n/a 2"), cite("three", "n/a 3")],
            1,
        );
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_untitled_citations_dedup_by_url_only() {
        let out = dedup_evidence(
            vec![cite("", "https://a.com/1"), cite("", "https://a.com/2")],
            2,
        );
        assert_eq!(out.len(), 2);
    }
}
