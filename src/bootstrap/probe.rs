//! Ordered browser capability probes.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an explicit browser executable.
pub const BROWSER_ENV: &str = "GATEFETCH_BROWSER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Brave,
    Chrome,
    Chromium,
    Safari,
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowserKind::Brave => "Brave",
            BrowserKind::Chrome => "Chrome",
            BrowserKind::Chromium => "Chromium",
            BrowserKind::Safari => "Safari",
        };
        f.write_str(name)
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available(PathBuf),
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }
}

/// Answers whether one browser can be driven on this machine.
pub trait BrowserProbe {
    fn kind(&self) -> BrowserKind;
    fn probe(&self) -> Availability;
}

/// Probe that checks well-known install locations.
#[derive(Debug, Clone)]
pub struct PathProbe {
    kind: BrowserKind,
    candidates: Vec<PathBuf>,
}

impl PathProbe {
    pub fn new(kind: BrowserKind, candidates: Vec<PathBuf>) -> Self {
        Self { kind, candidates }
    }

    /// Install locations for `kind` on the current OS.
    pub fn for_kind(kind: BrowserKind) -> Self {
        let mut candidates: Vec<PathBuf> = std::env::var_os(BROWSER_ENV)
            .map(PathBuf::from)
            .filter(|_| kind != BrowserKind::Safari)
            .into_iter()
            .collect();
        candidates.extend(install_paths(kind).iter().map(PathBuf::from));
        Self::new(kind, candidates)
    }
}

impl BrowserProbe for PathProbe {
    fn kind(&self) -> BrowserKind {
        self.kind
    }

    fn probe(&self) -> Availability {
        // No DevTools protocol, so there is nothing to drive.
        if self.kind == BrowserKind::Safari {
            return Availability::Unavailable("Safari cannot be automated over CDP".into());
        }
        if let Some(path) = self.candidates.iter().find(|p| p.exists()) {
            return Availability::Available(path.clone());
        }
        if matches!(self.kind, BrowserKind::Chrome | BrowserKind::Chromium) {
            if let Ok(path) = eoka::stealth::patcher::find_chrome() {
                return Availability::Available(path.into());
            }
        }
        Availability::Unavailable(format!("{} not installed", self.kind))
    }
}

#[cfg(target_os = "macos")]
fn install_paths(kind: BrowserKind) -> &'static [&'static str] {
    match kind {
        BrowserKind::Brave => &["/Applications/Brave Browser.app/Contents/MacOS/Brave Browser"],
        BrowserKind::Chrome => &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
        ],
        BrowserKind::Chromium => &["/Applications/Chromium.app/Contents/MacOS/Chromium"],
        BrowserKind::Safari => &["/Applications/Safari.app/Contents/MacOS/Safari"],
    }
}

#[cfg(target_os = "windows")]
fn install_paths(kind: BrowserKind) -> &'static [&'static str] {
    match kind {
        BrowserKind::Brave => {
            &[r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe"]
        }
        BrowserKind::Chrome => &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ],
        BrowserKind::Chromium | BrowserKind::Safari => &[],
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn install_paths(kind: BrowserKind) -> &'static [&'static str] {
    match kind {
        BrowserKind::Brave => &["/usr/bin/brave-browser", "/usr/bin/brave"],
        BrowserKind::Chrome => &["/usr/bin/google-chrome", "/usr/bin/google-chrome-stable"],
        BrowserKind::Chromium => &["/usr/bin/chromium", "/usr/bin/chromium-browser"],
        BrowserKind::Safari => &[],
    }
}

/// Probe each browser in order and return the first one available.
pub fn select(probes: &[Box<dyn BrowserProbe>]) -> Result<(BrowserKind, PathBuf)> {
    let mut tried = Vec::new();
    for probe in probes {
        match probe.probe() {
            Availability::Available(path) => {
                debug!("Using {} at {}", probe.kind(), path.display());
                return Ok((probe.kind(), path));
            }
            Availability::Unavailable(reason) => {
                debug!("Skipping {}: {}", probe.kind(), reason);
                tried.push(reason);
            }
        }
    }
    Err(Error::EnvironmentUnavailable(if tried.is_empty() {
        "no browsers configured".into()
    } else {
        format!("no supported browser found ({})", tried.join("; "))
    }))
}

/// Default probes for a preference list.
pub fn probes_for(preference: &[BrowserKind]) -> Vec<Box<dyn BrowserProbe>> {
    preference
        .iter()
        .map(|&kind| Box::new(PathProbe::for_kind(kind)) as Box<dyn BrowserProbe>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(BrowserKind, Availability);

    impl BrowserProbe for Fixed {
        fn kind(&self) -> BrowserKind {
            self.0
        }
        fn probe(&self) -> Availability {
            self.1.clone()
        }
    }

    #[test]
    fn test_select_first_available_in_order() {
        let probes: Vec<Box<dyn BrowserProbe>> = vec![
            Box::new(Fixed(BrowserKind::Brave, Availability::Unavailable("missing".into()))),
            Box::new(Fixed(BrowserKind::Chrome, Availability::Available("/c".into()))),
            Box::new(Fixed(BrowserKind::Chromium, Availability::Available("/cr".into()))),
        ];
        let (kind, path) = select(&probes).unwrap();
        assert_eq!(kind, BrowserKind::Chrome);
        assert_eq!(path, PathBuf::from("/c"));
    }

    #[test]
    fn test_select_none_available() {
        let probes: Vec<Box<dyn BrowserProbe>> = vec![Box::new(Fixed(
            BrowserKind::Brave,
            Availability::Unavailable("missing".into()),
        ))];
        let err = select(&probes).unwrap_err();
        assert!(matches!(err, Error::EnvironmentUnavailable(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_select_empty_list() {
        assert!(matches!(
            select(&[]),
            Err(Error::EnvironmentUnavailable(_))
        ));
    }

    #[test]
    fn test_safari_never_available() {
        let probe = PathProbe::new(BrowserKind::Safari, vec![std::env::temp_dir()]);
        assert!(!probe.probe().is_available());
    }

    #[test]
    fn test_path_probe_finds_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("brave");
        std::fs::write(&exe, b"").unwrap();
        let probe = PathProbe::new(
            BrowserKind::Brave,
            vec![dir.path().join("nope"), exe.clone()],
        );
        assert_eq!(probe.probe(), Availability::Available(exe));
    }

    #[test]
    fn test_brave_missing_paths() {
        let probe = PathProbe::new(BrowserKind::Brave, vec!["/definitely/not/here".into()]);
        assert_eq!(
            probe.probe(),
            Availability::Unavailable("Brave not installed".into())
        );
    }
}
