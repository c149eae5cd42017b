use super::{GateLauncher, GateSession};
use crate::config::BrowserConfig;
use crate::{Cookie, CookieSet, Result};
use async_trait::async_trait;
use eoka::{Browser, Page};
use std::path::Path;
use tracing::debug;

/// Find a clickable element by its text - returns a CSS selector.
const FIND_BY_TEXT_JS: &str = r#"(() => {
    const text = arguments[0].toLowerCase();
    const candidates = document.querySelectorAll('a, button, input[type="button"], input[type="submit"], [role="button"]');
    for (const el of candidates) {
        const label = (el.textContent || el.value || '').trim().toLowerCase();
        if (label !== text && !label.startsWith(text + ' ')) continue;
        if (el.id) return '#' + el.id;
        const path = [];
        let node = el;
        while (node && node !== document.body) {
            if (node.id) {
                path.unshift('#' + node.id);
                break;
            }
            let selector = node.tagName.toLowerCase();
            const siblings = Array.from(node.parentNode?.children || []);
            if (siblings.length > 1) selector += ':nth-child(' + (siblings.indexOf(node) + 1) + ')';
            path.unshift(selector);
            node = node.parentNode;
        }
        return path.join(' > ');
    }
    return null;
})()"#;

/// Launches the probed Chromium-family browser through eoka.
pub struct EokaLauncher;

/// eoka launch settings that start `executable` rather than eoka's own pick.
fn stealth_config(config: &BrowserConfig, executable: &Path) -> eoka::StealthConfig {
    eoka::StealthConfig {
        headless: config.headless,
        proxy: config.proxy.clone(),
        user_agent: config.user_agent.clone(),
        chrome_path: Some(executable.to_string_lossy().into_owned()),
        viewport_width: 1280,
        viewport_height: 900,
        ..Default::default()
    }
}

#[async_trait(?Send)]
impl GateLauncher for EokaLauncher {
    async fn launch(
        &self,
        config: &BrowserConfig,
        executable: &Path,
    ) -> Result<Box<dyn GateSession>> {
        debug!(
            "Launching {} (headless: {}, proxy: {:?})",
            executable.display(),
            config.headless,
            config.proxy
        );
        let browser = Browser::launch_with_config(stealth_config(config, executable)).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Box::new(EokaSession {
            browser,
            page,
            settle_ms: config.settle_ms,
        }))
    }
}

struct EokaSession {
    browser: Browser,
    page: Page,
    settle_ms: u64,
}

impl EokaSession {
    async fn find_by_text(&self, text: &str) -> Result<Option<String>> {
        let js = FIND_BY_TEXT_JS.replace("arguments[0]", &serde_json::to_string(text)?);
        Ok(self.page.evaluate(&js).await?)
    }
}

#[async_trait(?Send)]
impl GateSession for EokaSession {
    async fn open(&mut self, url: &str) -> Result<()> {
        debug!("goto: {}", url);
        self.page.goto(url).await?;
        self.page.wait(self.settle_ms).await;
        Ok(())
    }

    async fn click_gate(&mut self, selectors: &[String], texts: &[String]) -> Result<bool> {
        for sel in selectors {
            if self.page.try_click(sel).await? {
                debug!("gate: clicked selector '{}'", sel);
                self.page.wait(self.settle_ms).await;
                return Ok(true);
            }
        }
        for txt in texts {
            if let Some(sel) = self.find_by_text(txt).await? {
                if self.page.try_click(&sel).await? {
                    debug!("gate: clicked text '{}'", txt);
                    self.page.wait(self.settle_ms).await;
                    return Ok(true);
                }
            }
        }
        debug!("gate: no button found");
        Ok(false)
    }

    async fn cookies(&mut self) -> Result<CookieSet> {
        let raw = self.page.cookies().await?;
        let cookies: Vec<Cookie> = serde_json::from_value(serde_json::to_value(&raw)?)?;
        debug!("browser returned {} cookies", cookies.len());
        Ok(cookies.into_iter().collect())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let session = *self;
        session.browser.close().await?;
        Ok(())
    }
}
