use crate::{json, text, CookieSet, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed cookie store.
///
/// `load` prefers the structured file and only reads the plain-text file
/// when the structured one is absent. `save` rewrites both.
#[derive(Debug, Clone)]
pub struct CookieStore {
    json_path: PathBuf,
    text_path: PathBuf,
    default_domain: String,
}

impl CookieStore {
    pub fn new(
        json_path: impl Into<PathBuf>,
        text_path: impl Into<PathBuf>,
        default_domain: impl Into<String>,
    ) -> Self {
        Self {
            json_path: json_path.into(),
            text_path: text_path.into(),
            default_domain: default_domain.into(),
        }
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    /// Whether either cookie file is present.
    pub fn exists(&self) -> bool {
        self.json_path.exists() || self.text_path.exists()
    }

    /// Load the best available cookie set.
    pub fn load(&self) -> Result<CookieSet> {
        if self.json_path.exists() {
            let content = fs::read_to_string(&self.json_path)?;
            return json::parse(&content, &self.default_domain)
                .map_err(|e| parse_error(&self.json_path, e));
        }
        if self.text_path.exists() {
            let content = fs::read_to_string(&self.text_path)?;
            return text::parse(&content, &self.default_domain)
                .map_err(|e| parse_error(&self.text_path, e));
        }
        Err(Error::NotFound(format!(
            "{} or {}",
            self.json_path.display(),
            self.text_path.display()
        )))
    }

    /// Replace both files with `set`.
    pub fn save(&self, set: &CookieSet) -> Result<()> {
        write_atomic(&self.json_path, json::to_string(set)?.as_bytes())?;
        write_atomic(&self.text_path, text::to_string(set).as_bytes())?;
        Ok(())
    }

    /// Write a Netscape cookie file next to the others (for yt-dlp / curl).
    pub fn export_netscape(&self, set: &CookieSet, path: impl AsRef<Path>) -> Result<()> {
        write_atomic(path.as_ref(), text::to_netscape(set).as_bytes())
    }
}

fn parse_error(path: &Path, err: Error) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
