//! Paginated search over the site's search endpoint.

pub mod parse;

pub use parse::{Hit, SearchPage};

use crate::config::SiteConfig;
use crate::http::{Gate, Transport};
use crate::ledger::LedgerEntry;
use crate::{Error, Result};
use tracing::{debug, info, warn};
use url::Url;

/// Issues search requests through a [`Transport`].
pub struct SearchClient<'a, T: Transport + ?Sized> {
    transport: &'a T,
    endpoint: Url,
    gate: Gate,
}

impl<'a, T: Transport + ?Sized> SearchClient<'a, T> {
    pub fn new(transport: &'a T, site: &SiteConfig) -> Result<Self> {
        Ok(Self {
            transport,
            endpoint: site.search_endpoint()?,
            gate: Gate::new(&site.gate_markers),
        })
    }

    /// URL of the zero-based result page `page` for `query`.
    pub fn page_url(&self, query: &str, page: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("keys", query)
            .append_pair("page", &page.to_string());
        url
    }

    /// Lazily walk result pages, at most `max_pages` requests.
    pub fn pages(&self, query: &str, max_pages: u32) -> Pager<'_, 'a, T> {
        Pager {
            client: self,
            next: Some(self.page_url(query, 0)),
            fetched: 0,
            max_pages,
        }
    }

    /// Collect identifiers from up to `max_pages` pages, in page order.
    ///
    /// A page that fails in transit is skipped. A gate or denial fails the
    /// whole search with [`Error::AuthExpired`].
    pub async fn search(&self, query: &str, max_pages: u32) -> Result<SearchResult> {
        info!("Searching '{}' (max {} pages)", query, max_pages);
        let mut result = SearchResult::default();
        let mut pager = self.pages(query, max_pages);
        while let Some(outcome) = pager.next_page().await {
            match outcome? {
                PageOutcome::Fetched { number, hits, .. } => {
                    debug!("page {}: {} identifiers", number, hits.len());
                    result.pages_fetched += 1;
                    for hit in hits {
                        result.push(hit);
                    }
                }
                PageOutcome::Failed { number, .. } => result.failed_pages.push(number),
            }
        }
        info!(
            "'{}': {} identifiers from {} pages ({} failed)",
            query,
            result.hits.len(),
            result.pages_fetched,
            result.failed_pages.len()
        );
        Ok(result)
    }
}

/// One step of a [`Pager`].
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Fetched {
        number: u32,
        url: Url,
        hits: Vec<Hit>,
    },
    Failed {
        number: u32,
        url: Url,
        reason: String,
    },
}

/// Finite page sequence produced by [`SearchClient::pages`].
pub struct Pager<'c, 'a, T: Transport + ?Sized> {
    client: &'c SearchClient<'a, T>,
    next: Option<Url>,
    fetched: u32,
    max_pages: u32,
}

impl<T: Transport + ?Sized> Pager<'_, '_, T> {
    /// Fetch the next page. `None` once `max_pages` pages were requested or
    /// the last page had no next link.
    pub async fn next_page(&mut self) -> Option<Result<PageOutcome>> {
        if self.fetched >= self.max_pages {
            return None;
        }
        let url = self.next.take()?;
        self.fetched += 1;
        let number = self.fetched;

        let response = match self.client.transport.get(url.as_str()).await {
            Ok(response) => response,
            Err(e) => return Some(Ok(self.skip(number, url, e.to_string()))),
        };
        if self.client.gate.denies(&response) {
            return Some(Err(Error::AuthExpired(url.to_string())));
        }
        if !response.is_success() {
            let reason = format!("HTTP {}", response.status);
            return Some(Ok(self.skip(number, url, reason)));
        }

        let page = parse::parse_page(&response.text(), &url);
        self.next = page.next;
        Some(Ok(PageOutcome::Fetched {
            number,
            url,
            hits: page.hits,
        }))
    }

    fn skip(&mut self, number: u32, url: Url, reason: String) -> PageOutcome {
        warn!("page {} failed ({}), moving on", number, reason);
        self.next = parse::next_page(&url);
        PageOutcome::Failed {
            number,
            url,
            reason,
        }
    }
}

/// Identifiers gathered by one search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub hits: Vec<Hit>,
    pub pages_fetched: u32,
    /// 1-based numbers of pages that failed in transit.
    pub failed_pages: Vec<u32>,
}

impl SearchResult {
    fn push(&mut self, hit: Hit) {
        match self.hits.iter_mut().find(|h| h.id == hit.id) {
            Some(existing) => {
                if existing.dataset.is_none() {
                    existing.dataset = hit.dataset;
                }
            }
            None => self.hits.push(hit),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.id.clone()).collect()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.hits
            .iter()
            .map(|h| LedgerEntry::new(h.id.clone(), h.dataset))
            .collect()
    }

    /// Keep only the first `limit` identifiers.
    pub fn truncate(&mut self, limit: usize) {
        self.hits.truncate(limit);
    }
}
