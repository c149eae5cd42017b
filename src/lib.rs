//! # gatefetch
//!
//! Pass a document library's age gate once in a real browser, keep the
//! session cookies, then search, scrape and bulk-download documents over
//! plain HTTP with those cookies.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatefetch::{Config, HttpTransport, Ledger, SearchClient};
//!
//! # #[tokio::main]
//! # async fn main() -> gatefetch::Result<()> {
//! let config = Config::load_or_default("gatefetch.yaml")?;
//! let cookies = gatefetch::cookie_store(&config)?.load()?;
//! let transport = HttpTransport::new(cookies, None, config.site.base_url.as_str())?;
//!
//! let client = SearchClient::new(&transport, &config.site)?;
//! let result = client.search("flight log", 3).await?;
//! Ledger::new(&config.paths.ledger).append(&result.entries())?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod bootstrap;
pub mod campaign;
mod config;
pub mod download;
pub mod http;
pub mod ledger;
pub mod prompt;
pub mod search;
pub mod session;

pub use bootstrap::{Bootstrap, BrowserKind};
pub use campaign::{CampaignReport, CampaignRunner};
pub use config::{
    BrowserConfig, CampaignConfig, Config, DownloadConfig, Overrides, PathsConfig, SearchConfig,
    SiteConfig,
};
pub use download::{DownloadReport, Downloader, FailureKind};
pub use gatefetch_cookies::{Cookie, CookieSet, CookieStore};
pub use http::{Gate, HttpResponse, HttpTransport, Transport};
pub use ledger::{Ledger, LedgerEntry};
pub use search::{SearchClient, SearchResult};

/// Result type for gatefetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an operation.
///
/// Per-document download failures are not errors; they are recorded in
/// [`DownloadReport`] as [`FailureKind`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    #[error("session expired or rejected at {0}; run the login step again")]
    AuthExpired(String),

    #[error("navigation to {0} timed out; check the connection and retry")]
    NavigationTimeout(String),

    #[error("cookie error: {0}")]
    CookieParse(#[from] gatefetch_cookies::Error),

    #[error("ledger {path}: {source}")]
    Ledger {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),
}

impl Error {
    /// Whether re-running the browser login would likely fix this.
    pub fn needs_login(&self) -> bool {
        matches!(self, Error::AuthExpired(_) | Error::CookieParse(_))
    }
}

/// Cookie store at the configured paths, scoped to the site's cookie domain.
pub fn cookie_store(config: &Config) -> Result<CookieStore> {
    Ok(CookieStore::new(
        &config.paths.cookies_json,
        &config.paths.cookies_text,
        config.site.cookie_domain()?,
    ))
}
