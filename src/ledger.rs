//! Flat-file identifier ledger (`file_ids.txt`).
//!
//! One identifier per line, optionally followed by its dataset:
//!
//! ```text
//! # comments and blank lines are kept
//! EFTA00024813 - DataSet 8
//! EFTA00033177.pdf - DataSet 8
//! 00040001
//! ```

use crate::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const TEMPLATE: &str = "\
# One document identifier per line, e.g.
#   EFTA00024813
#   EFTA00024813.pdf - DataSet 8
# Lines starting with # are ignored.
";

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:EFTA)?(\d+)(?:\.\w+)?(?:\s*-\s*DataSet\s*(\d+))?$")
            .expect("static regex")
    })
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: String,
    pub dataset: Option<u32>,
}

impl LedgerEntry {
    pub fn new(id: impl Into<String>, dataset: Option<u32>) -> Self {
        Self {
            id: id.into(),
            dataset,
        }
    }

    /// Parse one line. `None` for blanks and comments.
    ///
    /// Bare numbers gain the `EFTA` prefix; anything else that is not the
    /// `EFTA` shape is kept verbatim as an opaque identifier.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        match line_regex().captures(line) {
            Some(caps) => Some(Self {
                id: format!("EFTA{}", &caps[1]),
                dataset: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            }),
            None => Some(Self::new(line, None)),
        }
    }

    pub fn to_line(&self) -> String {
        match self.dataset {
            Some(ds) => format!("{} - DataSet {}", self.id, ds),
            None => self.id.clone(),
        }
    }
}

/// Deduplicated, append-only identifier list.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in file order, first occurrence wins. Missing file is empty.
    pub fn read_all(&self) -> Result<Vec<LedgerEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        let mut seen = HashSet::new();
        Ok(content
            .lines()
            .filter_map(LedgerEntry::parse_line)
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect())
    }

    /// Merge `entries` into the file, skipping identifiers already present.
    ///
    /// Existing lines (comments included) are left untouched. Returns the
    /// number of new identifiers; when that is zero the file is not written.
    pub fn append(&self, entries: &[LedgerEntry]) -> Result<usize> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(self.io_error(e)),
        };
        let mut seen: HashSet<String> = existing
            .lines()
            .filter_map(LedgerEntry::parse_line)
            .map(|entry| entry.id)
            .collect();

        let fresh: Vec<&LedgerEntry> = entries
            .iter()
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect();
        if fresh.is_empty() {
            debug!("ledger {}: nothing new", self.path.display());
            return Ok(0);
        }

        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        for entry in &fresh {
            content.push_str(&entry.to_line());
            content.push('\n');
        }
        self.write(&content)?;
        debug!(
            "ledger {}: appended {} identifiers",
            self.path.display(),
            fresh.len()
        );
        Ok(fresh.len())
    }

    /// Create the file with usage comments if it does not exist yet.
    pub fn ensure_template(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write(TEMPLATE)?;
        Ok(true)
    }

    fn write(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("txt.tmp");
        fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::Ledger {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_shapes() {
        assert_eq!(
            LedgerEntry::parse_line("EFTA00024813.pdf - DataSet 8"),
            Some(LedgerEntry::new("EFTA00024813", Some(8)))
        );
        assert_eq!(
            LedgerEntry::parse_line("  EFTA00024813  "),
            Some(LedgerEntry::new("EFTA00024813", None))
        );
        assert_eq!(
            LedgerEntry::parse_line("00024813"),
            Some(LedgerEntry::new("EFTA00024813", None))
        );
        assert_eq!(
            LedgerEntry::parse_line("report-final"),
            Some(LedgerEntry::new("report-final", None))
        );
        assert_eq!(LedgerEntry::parse_line("# note"), None);
        assert_eq!(LedgerEntry::parse_line("   "), None);
    }

    #[test]
    fn test_to_line_round_trips_dataset() {
        let entry = LedgerEntry::new("EFTA00000007", Some(3));
        assert_eq!(entry.to_line(), "EFTA00000007 - DataSet 3");
        assert_eq!(LedgerEntry::parse_line(&entry.to_line()), Some(entry));
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("file_ids.txt"));
        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_all_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_ids.txt");
        fs::write(&path, "EFTA1\n# c\nEFTA2 - DataSet 4\nEFTA1.pdf\n00000002\n").unwrap();
        let entries = Ledger::new(&path).read_all().unwrap();
        assert_eq!(
            entries,
            vec![
                LedgerEntry::new("EFTA1", None),
                LedgerEntry::new("EFTA2", Some(4)),
                LedgerEntry::new("EFTA00000002", None),
            ]
        );
    }

    #[test]
    fn test_append_preserves_comments_and_skips_known() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_ids.txt");
        fs::write(&path, "# mine\nEFTA1").unwrap();
        let ledger = Ledger::new(&path);
        let added = ledger
            .append(&[
                LedgerEntry::new("EFTA1", None),
                LedgerEntry::new("EFTA2", Some(8)),
                LedgerEntry::new("EFTA2", None),
            ])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# mine\nEFTA1\nEFTA2 - DataSet 8\n"
        );
    }

    #[test]
    fn test_append_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("nested/file_ids.txt"));
        let entries = [
            LedgerEntry::new("EFTA00000001", None),
            LedgerEntry::new("EFTA00000002", None),
        ];
        assert_eq!(ledger.append(&entries).unwrap(), 2);
        let first = fs::read(ledger.path()).unwrap();
        assert_eq!(ledger.append(&entries).unwrap(), 0);
        assert_eq!(fs::read(ledger.path()).unwrap(), first);
    }

    #[test]
    fn test_ensure_template() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("file_ids.txt"));
        assert!(ledger.ensure_template().unwrap());
        assert!(!ledger.ensure_template().unwrap());
        assert!(ledger.read_all().unwrap().is_empty());
    }
}
