//! HTTP seam. Everything that talks to the site goes through [`Transport`],
//! so the search client and downloader can be driven by a fake in tests.

use crate::{CookieSet, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::borrow::Cow;
use tracing::debug;

const DEFAULT_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            url: url.into(),
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body starts like an HTML document (error page, gate, 404 template).
    pub fn looks_like_html(&self) -> bool {
        if self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
        {
            return true;
        }
        let head = &self.body[..self.body.len().min(512)];
        let head: String = String::from_utf8_lossy(head)
            .trim_start()
            .chars()
            .take(200)
            .collect::<String>()
            .to_ascii_lowercase();
        head.starts_with("<!doctype") || head.contains("<html")
    }
}

/// Recognizes the age/CAPTCHA gate in a response.
#[derive(Debug, Clone)]
pub struct Gate {
    markers: Vec<String>,
}

impl Gate {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_ascii_lowercase()).collect(),
        }
    }

    /// Denial status, a redirect onto a gate URL, or an HTML body carrying a gate marker.
    pub fn denies(&self, response: &HttpResponse) -> bool {
        if matches!(response.status, 401 | 403) {
            return true;
        }
        let url = response.url.to_ascii_lowercase();
        if self.markers.iter().any(|m| url.contains(m.as_str())) {
            return true;
        }
        if !response.looks_like_html() {
            return false;
        }
        let body = response.text().to_ascii_lowercase();
        self.markers.iter().any(|m| body.contains(m.as_str()))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`. `Err` means the request never produced a response.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// reqwest-backed transport that attaches the stored cookies per request host.
pub struct HttpTransport {
    client: reqwest::Client,
    cookies: CookieSet,
}

impl HttpTransport {
    pub fn new(cookies: CookieSet, user_agent: Option<&str>, referer: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(header::REFERER, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_UA))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, cookies })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let mut request = self.client.get(url);
        let cookie_header = self.cookies.header_for(&host);
        if !cookie_header.is_empty() {
            request = request.header(header::COOKIE, cookie_header);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse {
            status,
            url: final_url,
            content_type,
            body,
        })
    }
}
