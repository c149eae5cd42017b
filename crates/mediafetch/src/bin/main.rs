use clap::Parser;
use mediafetch::{Platform, YtDlp};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mediafetch")]
#[command(about = "Download media from YouTube, Instagram, TikTok and X")]
#[command(version)]
struct Cli {
    /// URL to download (prompted for when omitted)
    url: Option<String>,

    /// Download directory
    #[arg(long, default_value = "downloads")]
    dir: PathBuf,

    /// Directory holding cookies.json / cookies.txt to pass to yt-dlp
    #[arg(long)]
    cookies_dir: Option<PathBuf>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    println!("{}", "=".repeat(60));
    println!("Content Downloader");
    println!("Supports: YouTube, Instagram, TikTok, X.com (Twitter)");
    println!("{}", "=".repeat(60));

    let mut ytdlp = YtDlp::new(&cli.dir);
    if !ytdlp.is_available().await? {
        eprintln!("\nError: yt-dlp is not installed!");
        eprintln!("  brew install yt-dlp");
        eprintln!("  or");
        eprintln!("  pip install yt-dlp");
        std::process::exit(1);
    }

    if let Some(ref cookies_dir) = cli.cookies_dir {
        let out = cli.dir.join(".cookies-netscape.txt");
        std::fs::create_dir_all(&cli.dir)?;
        let count = mediafetch::export_cookies_for_ytdlp(cookies_dir, &out)?;
        println!("Using {} cookies from {}", count, cookies_dir.display());
        ytdlp = ytdlp.cookies_file(out);
    }

    let url = match cli.url {
        Some(url) => url,
        None => {
            print!("\nPaste your link below:\nURL: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    if url.is_empty() {
        eprintln!("No URL provided!");
        std::process::exit(1);
    }

    let Some(platform) = Platform::detect(&url) else {
        eprintln!("Unsupported platform for URL: {}", url);
        eprintln!("Supported platforms: YouTube, Instagram, TikTok, X.com");
        std::process::exit(1);
    };
    println!("Detected platform: {}", platform);
    println!("Saving to: {}\n", ytdlp.output_dir(platform).display());

    match ytdlp.download(platform, &url).await {
        Ok(dir) => {
            println!("\nDownload complete! Saved to: {}", dir.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("\nDownload failed: {}", e);
            eprintln!("\n{} troubleshooting:", platform);
            for (i, hint) in platform.troubleshooting().iter().enumerate() {
                eprintln!("  {}. {}", i + 1, hint);
            }
            std::process::exit(1);
        }
    }
}
