//! Authenticated session setup: stored cookies first, browser login when
//! they are missing, unreadable or rejected.

use crate::bootstrap::{Bootstrap, Confirm};
use crate::http::{Gate, HttpTransport, Transport};
use crate::{Config, CookieSet, Error, Result};
use tracing::{debug, info, warn};

/// Build a transport whose cookies currently pass the gate.
///
/// Runs the browser login when no usable cookie file exists, and once more
/// if the stored cookies are rejected.
pub async fn connect<C: Confirm>(config: &Config, confirm: &mut C) -> Result<HttpTransport> {
    let store = crate::cookie_store(config)?;
    let bootstrap = Bootstrap::new(&config.site, &config.browser, &store);

    let cookies = match store.load() {
        Ok(set) if !set.is_empty() => {
            info!("Loaded {} cookies", set.len());
            set
        }
        Ok(_) => {
            println!("Cookie file is empty, opening the browser to log in.");
            bootstrap.run_default(confirm).await?
        }
        Err(e) => {
            println!("No usable cookies ({}), opening the browser to log in.", e);
            bootstrap.run_default(confirm).await?
        }
    };

    let transport = build_transport(config, cookies)?;
    if verify(&transport, config).await? {
        return Ok(transport);
    }

    warn!("Stored cookies were rejected, logging in again");
    println!("Saved session is stale, opening the browser to log in again.");
    let transport = build_transport(config, bootstrap.run_default(confirm).await?)?;
    if verify(&transport, config).await? {
        Ok(transport)
    } else {
        Err(Error::AuthExpired(config.site.probe_url()?))
    }
}

/// Whether one request for the probe document returns the document.
///
/// Any HTML answer counts as a failure: the gate and error pages are HTML.
pub async fn verify<T: Transport + ?Sized>(transport: &T, config: &Config) -> Result<bool> {
    let url = config.site.probe_url()?;
    let response = transport.get(&url).await?;
    let denied = Gate::new(&config.site.gate_markers).denies(&response);
    let html = response.looks_like_html();
    debug!(
        "verify {} -> {} (denied: {}, html: {})",
        url, response.status, denied, html
    );
    Ok(response.is_success() && !denied && !html)
}

fn build_transport(config: &Config, cookies: CookieSet) -> Result<HttpTransport> {
    HttpTransport::new(
        cookies,
        config.browser.user_agent.as_deref(),
        &config.site.base_url()?.to_string(),
    )
}
