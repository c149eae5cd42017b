//! Bulk document download.

use crate::http::{Gate, Transport};
use crate::ledger::LedgerEntry;
use crate::{Config, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Why one identifier was not downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureKind {
    /// The gate answered instead of the document; log in again.
    AuthDenied,
    /// No dataset/extension combination produced a document.
    NotFound,
    /// Unexpected HTTP status.
    Http(u16),
    /// The request never got a response.
    Network(String),
    /// The document arrived but could not be written.
    Io(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub id: String,
    #[serde(flatten)]
    pub kind: FailureKind,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<Failure>,
}

impl Default for DownloadReport {
    fn default() -> Self {
        Self {
            generated_at: Utc::now(),
            total: 0,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl DownloadReport {
    pub fn auth_denied(&self) -> usize {
        self.failed
            .iter()
            .filter(|f| f.kind == FailureKind::AuthDenied)
            .count()
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)? + "\n")?;
        Ok(())
    }
}

enum Outcome {
    Saved(PathBuf),
    Failed(FailureKind),
}

/// Fetches documents to `<dest>/<ext>/<id><ext>`.
pub struct Downloader<'a, T: Transport + ?Sized> {
    transport: &'a T,
    base: Url,
    gate: Gate,
    dest: PathBuf,
    extensions: Vec<String>,
    datasets: Vec<u32>,
    delay: Duration,
}

impl<'a, T: Transport + ?Sized> Downloader<'a, T> {
    pub fn new(transport: &'a T, config: &Config) -> Result<Self> {
        Ok(Self {
            transport,
            base: config.site.base_url()?,
            gate: Gate::new(&config.site.gate_markers),
            dest: config.paths.download_dir.clone(),
            extensions: config.download.extensions.clone(),
            datasets: config.download.datasets.clone(),
            delay: Duration::from_millis(config.download.delay_ms),
        })
    }

    /// Write into `dest` instead of the configured download directory.
    pub fn dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = dest.into();
        self
    }

    pub fn document_url(&self, dataset: u32, id: &str, ext: &str) -> Result<Url> {
        let path = format!("files/DataSet%20{}/{}{}", dataset, id, ext);
        self.base
            .join(&path)
            .map_err(|e| crate::Error::Config(format!("bad document path '{}': {}", path, e)))
    }

    pub fn target_path(&self, id: &str, ext: &str) -> PathBuf {
        self.dest
            .join(ext.trim_start_matches('.'))
            .join(format!("{}{}", id, ext))
    }

    /// Non-empty file already on disk for `id`, under any configured extension.
    pub fn existing(&self, id: &str) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.target_path(id, ext))
            .find(|path| fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0))
    }

    /// Download every entry in order. Individual failures are recorded, not raised.
    pub async fn download(&self, entries: &[LedgerEntry]) -> DownloadReport {
        let mut report = DownloadReport {
            total: entries.len(),
            ..Default::default()
        };
        let mut hit_network = false;

        for (i, entry) in entries.iter().enumerate() {
            if let Some(path) = self.existing(&entry.id) {
                debug!("[{}/{}] {} exists at {}", i + 1, entries.len(), entry.id, path.display());
                report.skipped.push(entry.id.clone());
                continue;
            }
            if hit_network && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            hit_network = true;

            match self.fetch(entry).await {
                Outcome::Saved(path) => {
                    info!("[{}/{}] {} -> {}", i + 1, entries.len(), entry.id, path.display());
                    report.succeeded.push(entry.id.clone());
                }
                Outcome::Failed(kind) => {
                    warn!("[{}/{}] {} failed: {:?}", i + 1, entries.len(), entry.id, kind);
                    report.failed.push(Failure {
                        id: entry.id.clone(),
                        kind,
                    });
                }
            }
        }
        report
    }

    async fn fetch(&self, entry: &LedgerEntry) -> Outcome {
        let datasets = match entry.dataset {
            Some(ds) => vec![ds],
            None => self.datasets.clone(),
        };

        for dataset in datasets {
            for ext in &self.extensions {
                let url = match self.document_url(dataset, &entry.id, ext) {
                    Ok(url) => url,
                    Err(e) => return Outcome::Failed(FailureKind::Io(e.to_string())),
                };
                let response = match self.transport.get(url.as_str()).await {
                    Ok(response) => response,
                    Err(e) => return Outcome::Failed(FailureKind::Network(e.to_string())),
                };
                if self.gate.denies(&response) {
                    return Outcome::Failed(FailureKind::AuthDenied);
                }
                // 404 template or HTML error page: not at this location
                if matches!(response.status, 404 | 410)
                    || (response.is_success() && response.looks_like_html())
                {
                    debug!("{} not at {}", entry.id, url);
                    continue;
                }
                if !response.is_success() {
                    return Outcome::Failed(FailureKind::Http(response.status));
                }

                let path = self.target_path(&entry.id, ext);
                return match write_atomic(&path, &response.body) {
                    Ok(()) => Outcome::Saved(path),
                    Err(e) => Outcome::Failed(FailureKind::Io(e.to_string())),
                };
            }
        }
        Outcome::Failed(FailureKind::NotFound)
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);
    fs::write(&part, body)?;
    fs::rename(&part, path)
}
