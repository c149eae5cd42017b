//! # gatefetch-cookies
//!
//! A cookie set harvested from a gated site, and a file-backed store that
//! keeps it in two interchangeable formats:
//!
//! - `cookies.json`: structured list of `{name, value, domain, path, expires}`
//! - `cookies.txt`: plain `name=value` lines grouped under `# domain:` comments
//!
//! ```rust,no_run
//! use gatefetch_cookies::CookieStore;
//!
//! # fn main() -> gatefetch_cookies::Result<()> {
//! let store = CookieStore::new("cookies.json", "cookies.txt", ".justice.gov");
//! let cookies = store.load()?;
//! println!("{} cookies, header: {}", cookies.len(), cookies.header_for("www.justice.gov"));
//! # Ok(())
//! # }
//! ```

pub mod json;
mod store;
pub mod text;

pub use store::CookieStore;

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Result type for cookie operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from parsing or persisting cookies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no cookie file found (looked for {0})")]
    NotFound(String),

    #[error("malformed cookie file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds. Absent for session cookies.
    #[serde(
        default,
        alias = "expiry",
        deserialize_with = "de_expires",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, alias = "httpOnly")]
    pub http_only: bool,
}

fn default_path() -> String {
    "/".into()
}

// Browsers report expiry as a float and use -1 for session cookies.
fn de_expires<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| v.as_f64())
        .filter(|secs| *secs > 0.0)
        .map(|secs| secs as i64))
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn expires(mut self, secs: i64) -> Self {
        self.expires = Some(secs);
        self
    }

    /// Whether this cookie would be sent to `host`.
    ///
    /// A leading-dot domain matches the bare domain and every subdomain; a
    /// host-only domain matches exactly. An empty domain matches anything.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let domain = self.domain.to_ascii_lowercase();
        if domain.is_empty() {
            return true;
        }
        match domain.strip_prefix('.') {
            Some(bare) => host == bare || host.ends_with(&domain),
            None => host == domain,
        }
    }
}

/// A set of cookies with at most one value per (name, domain).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    cookies: Vec<Cookie>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cookie, replacing any existing cookie with the same name and domain.
    pub fn insert(&mut self, cookie: Cookie) {
        match self
            .cookies
            .iter_mut()
            .find(|c| c.name == cookie.name && c.domain.eq_ignore_ascii_case(&cookie.domain))
        {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// Keep only cookies that would be sent to `host`.
    pub fn scoped_to(&self, host: &str) -> CookieSet {
        self.cookies
            .iter()
            .filter(|c| c.matches_host(host))
            .cloned()
            .collect()
    }

    /// `Cookie:` header value for a request to `host`.
    pub fn header_for(&self, host: &str) -> String {
        self.cookies
            .iter()
            .filter(|c| c.matches_host(host))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<Cookie> for CookieSet {
    fn from_iter<I: IntoIterator<Item = Cookie>>(iter: I) -> Self {
        let mut set = CookieSet::new();
        for cookie in iter {
            set.insert(cookie);
        }
        set
    }
}

impl IntoIterator for CookieSet {
    type Item = Cookie;
    type IntoIter = std::vec::IntoIter<Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.into_iter()
    }
}
