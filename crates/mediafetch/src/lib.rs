//! # mediafetch
//!
//! Thin wrapper around `yt-dlp` for YouTube, Instagram, TikTok and X.
//! Files land in `<download_dir>/<platform>/`.
//!
//! ```rust,no_run
//! use mediafetch::{Platform, YtDlp};
//!
//! # #[tokio::main]
//! # async fn main() -> mediafetch::Result<()> {
//! let url = "https://youtu.be/dQw4w9WgXcQ";
//! let platform = Platform::detect(url).ok_or_else(|| mediafetch::Error::UnsupportedUrl(url.into()))?;
//! let ytdlp = YtDlp::new("downloads");
//! if ytdlp.is_available().await? {
//!     ytdlp.download(platform, url).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Result type for mediafetch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported platform for URL: {0}")]
    UnsupportedUrl(String),

    #[error("{0} is not installed")]
    ToolMissing(String),

    #[error("{platform} download failed (exit code {code:?})")]
    DownloadFailed { platform: Platform, code: Option<i32> },

    #[error("cookie error: {0}")]
    Cookies(#[from] gatefetch_cookies::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const DESKTOP_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const CHROME_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
    X,
}

impl Platform {
    const HOSTS: &'static [(&'static str, Platform)] = &[
        ("youtube.com", Platform::YouTube),
        ("youtu.be", Platform::YouTube),
        ("instagram.com", Platform::Instagram),
        ("tiktok.com", Platform::TikTok),
        ("twitter.com", Platform::X),
        ("x.com", Platform::X),
    ];

    /// Detect the platform from a URL's host. Scheme-less input is accepted.
    pub fn detect(input: &str) -> Option<Platform> {
        let input = input.trim();
        let parsed = url::Url::parse(input)
            .or_else(|_| url::Url::parse(&format!("https://{}", input)))
            .ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        Self::HOSTS
            .iter()
            .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
            .map(|(_, p)| *p)
    }

    /// Folder name under the download directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::X => "x",
        }
    }

    pub fn troubleshooting(self) -> &'static [&'static str] {
        match self {
            Platform::YouTube => &[
                "Update yt-dlp: brew upgrade yt-dlp (or pip install -U yt-dlp)",
                "Age-restricted videos need cookies: pass --cookies-dir",
            ],
            Platform::Instagram => &[
                "Instagram requires login: export cookies and pass --cookies-dir",
                "Make sure you're logged into Instagram in your browser",
                "Some posts may be private or restricted",
                "Update yt-dlp: brew upgrade yt-dlp",
            ],
            Platform::TikTok => &[
                "Update yt-dlp: brew upgrade yt-dlp",
                "Some TikTok videos may be region-locked or private",
                "Retry with --cookies-dir if this keeps failing",
            ],
            Platform::X => &[
                "Make sure the post is public",
                "Log into X.com in your browser and pass --cookies-dir",
                "Update yt-dlp: brew upgrade yt-dlp",
            ],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::YouTube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::X => "X",
        };
        f.write_str(name)
    }
}

/// A configured `yt-dlp` invocation.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    download_dir: PathBuf,
    cookies_file: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            download_dir: download_dir.into(),
            cookies_file: None,
        }
    }

    /// Use a different executable (absolute path or name on PATH).
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Pass a Netscape cookie file via `--cookies`.
    pub fn cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    pub fn output_dir(&self, platform: Platform) -> PathBuf {
        self.download_dir.join(platform.dir_name())
    }

    /// `yt-dlp --version` succeeds. A missing binary is `Ok(false)`.
    pub async fn is_available(&self) -> Result<bool> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;
        match output {
            Ok(output) => {
                debug!(
                    "yt-dlp version: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
                Ok(output.status.success())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Arguments for one download, without the program name.
    pub fn args(&self, platform: Platform, url: &str) -> Vec<String> {
        let dir = self.output_dir(platform);
        let template = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let mut args: Vec<String> = match platform {
            Platform::YouTube => vec![
                "-f".into(),
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".into(),
                "--merge-output-format".into(),
                "mp4".into(),
                "--no-check-certificate".into(),
                "-o".into(),
                template("%(title)s.%(ext)s"),
            ],
            Platform::TikTok => vec![
                "--no-check-certificate".into(),
                "--user-agent".into(),
                DESKTOP_UA.into(),
                "-o".into(),
                template("%(title)s.%(ext)s"),
            ],
            Platform::Instagram => vec![
                "--no-check-certificate".into(),
                "--user-agent".into(),
                CHROME_UA.into(),
                "--write-thumbnail".into(),
                "-o".into(),
                template("%(uploader)s_%(id)s.%(ext)s"),
            ],
            Platform::X => vec![
                "--no-check-certificate".into(),
                "--user-agent".into(),
                DESKTOP_UA.into(),
                "--write-thumbnail".into(),
                "-o".into(),
                template("%(uploader)s_%(id)s.%(ext)s"),
            ],
        };

        if let Some(ref cookies) = self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args.push(url.to_string());
        args
    }

    /// Run the download with inherited stdio so yt-dlp's progress shows.
    pub async fn download(&self, platform: Platform, url: &str) -> Result<PathBuf> {
        let dir = self.output_dir(platform);
        tokio::fs::create_dir_all(&dir).await?;

        let args = self.args(platform, url);
        info!("yt-dlp {}", args.join(" "));
        let status = Command::new(&self.program).args(&args).status().await?;
        if !status.success() {
            return Err(Error::DownloadFailed {
                platform,
                code: status.code(),
            });
        }
        Ok(dir)
    }
}

/// Convert a gatefetch cookie store in `dir` into a Netscape file for `--cookies`.
pub fn export_cookies_for_ytdlp(dir: &Path, out: &Path) -> Result<usize> {
    let store = gatefetch_cookies::CookieStore::new(
        dir.join("cookies.json"),
        dir.join("cookies.txt"),
        "",
    );
    let cookies = store.load()?;
    store.export_netscape(&cookies, out)?;
    Ok(cookies.len())
}
