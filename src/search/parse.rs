//! Turns one search response into identifiers plus the next-page reference.
//!
//! Two response shapes are understood: the Elasticsearch JSON returned by
//! the library's search endpoint, and rendered HTML result pages.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

/// One identifier found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: String,
    /// Dataset number when the page reveals it.
    pub dataset: Option<u32>,
}

/// A parsed result page.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Unique identifiers in page order.
    pub hits: Vec<Hit>,
    /// Absolute URL of the next page, if the page links one.
    pub next: Option<Url>,
    /// Total result count, when the page reports it.
    pub total: Option<u64>,
}

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bEFTA\d+").expect("static regex"))
}

// "DataSet%208/EFTA00024813" in hrefs and URIs
fn dataset_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)DataSet(?:%20|\+|\s)*(\d+)/(EFTA\d+)").expect("static regex")
    })
}

// "EFTA00024813.pdf - DataSet 8" in link text
fn dataset_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(EFTA\d+)(?:\.\w+)?\s*-\s*DataSet\s*(\d+)").expect("static regex")
    })
}

fn next_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\b([^>]*)>\s*(?:<[^>]+>\s*)*next\b"#).expect("static regex")
    })
}

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("static regex"))
}

/// Parse a response body fetched from `page_url`.
pub fn parse_page(body: &str, page_url: &Url) -> SearchPage {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if let Some(page) = parse_json(&value, page_url) {
                return page;
            }
        }
    }
    parse_html(body, page_url)
}

/// Elasticsearch-style `{hits: {total: {value}, hits: [{_source: {...}}]}}`.
fn parse_json(value: &Value, page_url: &Url) -> Option<SearchPage> {
    let hits = value.get("hits")?;
    let entries = hits.get("hits")?.as_array()?;
    let total = hits
        .get("total")
        .and_then(|t| t.get("value").or(Some(t)))
        .and_then(Value::as_u64);

    let mut page = SearchPage {
        total,
        ..Default::default()
    };
    for entry in entries {
        let source = &entry["_source"];
        let name = source["ORIGIN_FILE_NAME"].as_str().unwrap_or_default();
        let uri = source["ORIGIN_FILE_URI"].as_str().unwrap_or_default();
        let Some(id) = id_regex().find(name).or_else(|| id_regex().find(uri)) else {
            continue;
        };
        let dataset = dataset_path_regex()
            .captures(uri)
            .and_then(|c| c[1].parse().ok());
        push_hit(&mut page.hits, id.as_str(), dataset);
    }

    let seen = page_number(page_url)
        .saturating_add(1)
        .saturating_mul(entries.len() as u64);
    if !entries.is_empty() && total.is_some_and(|t| seen < t) {
        page.next = next_page(page_url);
    }
    Some(page)
}

fn parse_html(body: &str, page_url: &Url) -> SearchPage {
    let mut page = SearchPage::default();
    for m in id_regex().find_iter(body) {
        push_hit(&mut page.hits, m.as_str(), None);
    }

    let hints = dataset_path_regex()
        .captures_iter(body)
        .map(|c| (c[2].to_string(), c[1].to_string()))
        .chain(
            dataset_label_regex()
                .captures_iter(body)
                .map(|c| (c[1].to_string(), c[2].to_string())),
        );
    for (id, dataset) in hints {
        if let (Some(hit), Ok(ds)) = (page.hits.iter_mut().find(|h| h.id == id), dataset.parse()) {
            hit.dataset.get_or_insert(ds);
        }
    }

    page.next = find_next_link(body, page_url);
    page
}

fn find_next_link(body: &str, page_url: &Url) -> Option<Url> {
    for caps in next_link_regex().captures_iter(body) {
        let attrs = &caps[1];
        let lower = attrs.to_ascii_lowercase();
        if lower.contains("aria-disabled=\"true\"") || lower.contains("disabled") {
            continue;
        }
        let Some(href) = href_regex().captures(attrs) else {
            continue;
        };
        let href = href[1].replace("&amp;", "&");
        if href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        if let Ok(url) = page_url.join(&href) {
            return Some(url);
        }
    }
    None
}

fn push_hit(hits: &mut Vec<Hit>, id: &str, dataset: Option<u32>) {
    match hits.iter_mut().find(|h| h.id == id) {
        Some(existing) => {
            if existing.dataset.is_none() {
                existing.dataset = dataset;
            }
        }
        None => hits.push(Hit {
            id: id.to_string(),
            dataset,
        }),
    }
}

/// Zero-based `page` query parameter, 0 when absent.
pub fn page_number(url: &Url) -> u64 {
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0)
}

/// `url` advanced by one page; `None` when the page number cannot grow.
pub fn next_page(url: &Url) -> Option<Url> {
    page_number(url).checked_add(1).map(|n| with_page(url, n))
}

/// `url` with its `page` parameter replaced.
pub fn with_page(url: &Url, page: u64) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut next = url.clone();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &page.to_string());
    next
}
