use clap::Parser;
use gatefetch_cookies::{text, CookieStore};
use std::io::Read;
use std::path::PathBuf;

/// Import cookies pasted from browser DevTools (or name=value lines) on stdin.
#[derive(Parser)]
#[command(name = "cookie-import")]
#[command(about = "Save pasted cookies as cookies.json + cookies.txt")]
#[command(version)]
struct Cli {
    /// Domain for rows that don't carry one
    #[arg(long, default_value = ".justice.gov")]
    domain: String,

    /// Directory to write cookies.json and cookies.txt into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Also write a Netscape cookie file (for yt-dlp --cookies)
    #[arg(long, value_name = "PATH")]
    netscape: Option<PathBuf>,
}

fn main() -> gatefetch_cookies::Result<()> {
    let cli = Cli::parse();

    eprintln!("Paste cookie rows (tab-separated or name=value), then Ctrl-D:");
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let cookies = text::parse(&input, &cli.domain)?;
    if cookies.is_empty() {
        eprintln!("No cookies found in input.");
        std::process::exit(1);
    }

    let store = CookieStore::new(
        cli.out_dir.join("cookies.json"),
        cli.out_dir.join("cookies.txt"),
        cli.domain,
    );
    store.save(&cookies)?;
    println!(
        "Saved {} cookies to {} and {}",
        cookies.len(),
        store.json_path().display(),
        store.text_path().display()
    );

    if let Some(path) = cli.netscape {
        store.export_netscape(&cookies, &path)?;
        println!("Netscape export: {}", path.display());
    }

    Ok(())
}
