//! The menu's operations, independent of how the transport was built.

use crate::campaign::{CampaignReport, CampaignRunner};
use crate::download::{DownloadReport, Downloader};
use crate::http::Transport;
use crate::ledger::Ledger;
use crate::search::SearchClient;
use crate::{Config, Result};
use tracing::info;

/// What a scrape added to the ledger.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    pub found: usize,
    pub added: usize,
    pub failed_pages: Vec<u32>,
}

/// Search `query` and append every identifier to the ledger.
pub async fn scrape<T: Transport + ?Sized>(
    transport: &T,
    config: &Config,
    query: &str,
    max_pages: u32,
) -> Result<ScrapeSummary> {
    let client = SearchClient::new(transport, &config.site)?;
    let result = client.search(query, max_pages).await?;
    let added = Ledger::new(&config.paths.ledger).append(&result.entries())?;
    Ok(ScrapeSummary {
        found: result.hits.len(),
        added,
        failed_pages: result.failed_pages,
    })
}

/// Download everything in the ledger and write the summary file.
///
/// An empty or missing ledger gets a commented template and an empty report.
pub async fn download_ledger<T: Transport + ?Sized>(
    transport: &T,
    config: &Config,
) -> Result<DownloadReport> {
    let ledger = Ledger::new(&config.paths.ledger);
    let entries = ledger.read_all()?;
    if entries.is_empty() {
        if ledger.ensure_template()? {
            info!("Created {}", ledger.path().display());
        }
        return Ok(DownloadReport::default());
    }

    let report = Downloader::new(transport, config)?.download(&entries).await;
    report.save(config.paths.summary_path())?;
    Ok(report)
}

/// Run the keyword campaign and write its report.
pub async fn campaign<T: Transport + ?Sized>(
    transport: &T,
    config: &Config,
    per_keyword_limit: usize,
    max_pages: u32,
) -> Result<CampaignReport> {
    let client = SearchClient::new(transport, &config.site)?;
    let ledger = Ledger::new(&config.paths.ledger);
    let mut report = CampaignReport::new(per_keyword_limit);
    let outcome = CampaignRunner::new(&client, &ledger)
        .run_into(&mut report, &config.campaign.keywords, max_pages)
        .await;
    report.save(config.paths.report_path())?;
    outcome.map(|()| report)
}
