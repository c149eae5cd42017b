//! Browser login: pass the gate by hand once, keep the cookies.

mod eoka_session;
pub mod probe;

pub use eoka_session::EokaLauncher;
pub use probe::{Availability, BrowserKind, BrowserProbe, PathProbe};

use crate::config::{BrowserConfig, SiteConfig};
use crate::{CookieSet, CookieStore, Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Starts a controllable browser.
#[async_trait(?Send)]
pub trait GateLauncher {
    async fn launch(&self, config: &BrowserConfig, executable: &Path)
        -> Result<Box<dyn GateSession>>;
}

/// A live browser session.
#[async_trait(?Send)]
pub trait GateSession {
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Try each selector, then each button text. Returns whether anything was clicked.
    async fn click_gate(&mut self, selectors: &[String], texts: &[String]) -> Result<bool>;

    async fn cookies(&mut self) -> Result<CookieSet>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Blocks until the operator says the gate has been passed.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> Result<()>;
}

/// Runs the credential bootstrap against one site.
pub struct Bootstrap<'a> {
    site: &'a SiteConfig,
    browser: &'a BrowserConfig,
    store: &'a CookieStore,
}

impl<'a> Bootstrap<'a> {
    pub fn new(site: &'a SiteConfig, browser: &'a BrowserConfig, store: &'a CookieStore) -> Self {
        Self {
            site,
            browser,
            store,
        }
    }

    /// Probe the configured browsers in preference order and log in with eoka.
    pub async fn run_default<C: Confirm>(&self, confirm: &mut C) -> Result<CookieSet> {
        let probes = probe::probes_for(&self.browser.preference);
        self.run(&probes, &EokaLauncher, confirm).await
    }

    /// Open the first available browser on the site, wait for the operator,
    /// then save the site's cookies. Re-running replaces the stored set.
    pub async fn run<L, C>(
        &self,
        probes: &[Box<dyn BrowserProbe>],
        launcher: &L,
        confirm: &mut C,
    ) -> Result<CookieSet>
    where
        L: GateLauncher,
        C: Confirm,
    {
        let (kind, executable) = probe::select(probes)?;
        info!("Launching {} for login", kind);

        let mut session = launcher.launch(self.browser, &executable).await?;
        let harvested = self.harvest(session.as_mut(), confirm).await;
        if let Err(e) = session.close().await {
            warn!("Failed to close browser: {}", e);
        }

        let host = self.site.host()?;
        let cookies = harvested?.scoped_to(&host);
        if cookies.is_empty() {
            return Err(Error::AuthExpired(format!(
                "{} (browser returned no cookies for {})",
                self.site.base_url, host
            )));
        }

        self.store.save(&cookies)?;
        info!(
            "Saved {} cookies to {}",
            cookies.len(),
            self.store.json_path().display()
        );
        Ok(cookies)
    }

    async fn harvest<C: Confirm>(
        &self,
        session: &mut dyn GateSession,
        confirm: &mut C,
    ) -> Result<CookieSet> {
        let url = self.site.base_url()?.to_string();
        let deadline = Duration::from_millis(self.browser.navigation_timeout_ms);
        tokio::time::timeout(deadline, session.open(&url))
            .await
            .map_err(|_| Error::NavigationTimeout(url.clone()))??;

        let clicked = session
            .click_gate(&self.browser.gate_selectors, &self.browser.gate_texts)
            .await?;
        if clicked {
            info!("Clicked through the age gate");
        }

        confirm.confirm(
            "Complete any age check or CAPTCHA in the browser window, then press Enter here",
        )?;
        session.cookies().await
    }
}
