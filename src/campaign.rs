//! Keyword campaign: one search per keyword, feeding the ledger and a report.

use crate::http::Transport;
use crate::ledger::Ledger;
use crate::search::SearchClient;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub identifiers: Vec<String>,
    /// Identifiers kept after the per-keyword limit.
    pub count: usize,
    /// Identifiers the search returned before truncation.
    pub found: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<u32>,
}

/// Why a campaign stopped early.
#[derive(Debug, Clone, Serialize)]
pub struct Aborted {
    pub keyword: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub generated_at: DateTime<Utc>,
    pub per_keyword_limit: usize,
    pub keywords: Vec<KeywordEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<Aborted>,
}

impl CampaignReport {
    pub fn new(per_keyword_limit: usize) -> Self {
        Self {
            generated_at: Utc::now(),
            per_keyword_limit,
            keywords: Vec::new(),
            aborted: None,
        }
    }

    pub fn entry(&self, keyword: &str) -> Option<&KeywordEntry> {
        self.keywords.iter().find(|k| k.keyword == keyword)
    }

    pub fn total_identifiers(&self) -> usize {
        self.keywords.iter().map(|k| k.count).sum()
    }

    /// Write the whole report as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)? + "\n")?;
        Ok(())
    }
}

/// Runs keywords one after another through a [`SearchClient`].
pub struct CampaignRunner<'c, 'a, T: Transport + ?Sized> {
    client: &'c SearchClient<'a, T>,
    ledger: &'c Ledger,
}

impl<'c, 'a, T: Transport + ?Sized> CampaignRunner<'c, 'a, T> {
    pub fn new(client: &'c SearchClient<'a, T>, ledger: &'c Ledger) -> Self {
        Self { client, ledger }
    }

    /// Search each keyword, keep the first `per_keyword_limit` identifiers
    /// and append them to the ledger as each keyword completes.
    ///
    /// An expired session stops the campaign and returns the keywords
    /// finished so far with [`CampaignReport::aborted`] set. Other errors
    /// propagate; use [`CampaignRunner::run_into`] to keep the partial report.
    pub async fn run(
        &self,
        keywords: &[String],
        per_keyword_limit: usize,
        max_pages: u32,
    ) -> Result<CampaignReport> {
        let mut report = CampaignReport::new(per_keyword_limit);
        self.run_into(&mut report, keywords, max_pages).await?;
        Ok(report)
    }

    /// Like [`CampaignRunner::run`], filling `report` in place. On an error
    /// other than an expired session, `report` holds the finished keywords
    /// and names the failing one in `aborted` before the error is returned.
    pub async fn run_into(
        &self,
        report: &mut CampaignReport,
        keywords: &[String],
        max_pages: u32,
    ) -> Result<()> {
        for (i, keyword) in keywords.iter().enumerate() {
            info!("[{}/{}] keyword '{}'", i + 1, keywords.len(), keyword);
            match self.keyword(keyword, report.per_keyword_limit, max_pages).await {
                Ok(entry) => report.keywords.push(entry),
                Err(e) => {
                    warn!("Stopping campaign at '{}': {}", keyword, e);
                    report.aborted = Some(Aborted {
                        keyword: keyword.clone(),
                        reason: e.to_string(),
                    });
                    return match e {
                        Error::AuthExpired(_) => Ok(()),
                        e => Err(e),
                    };
                }
            }
        }
        Ok(())
    }

    async fn keyword(&self, keyword: &str, limit: usize, max_pages: u32) -> Result<KeywordEntry> {
        let mut result = self.client.search(keyword, max_pages).await?;
        let found = result.hits.len();
        result.truncate(limit);
        let added = self.ledger.append(&result.entries())?;
        info!(
            "'{}': kept {} of {} ({} new in ledger)",
            keyword,
            result.hits.len(),
            found,
            added
        );

        Ok(KeywordEntry {
            keyword: keyword.to_string(),
            count: result.hits.len(),
            identifiers: result.ids(),
            found,
            failed_pages: result.failed_pages,
        })
    }
}
