use clap::{Parser, Subcommand};
use gatefetch::prompt::Console;
use gatefetch::{actions, session, Bootstrap, CampaignReport, Config, DownloadReport, Overrides};
use gatefetch::{HttpTransport, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

type Stdio = Console<std::io::StdinLock<'static>, std::io::Stdout>;

#[derive(Parser)]
#[command(name = "gatefetch")]
#[command(about = "Log in through a site's age gate once, then scrape and download its documents")]
#[command(version)]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(short, long, default_value = "gatefetch.yaml")]
    config: PathBuf,

    /// Override a setting (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Run the login browser headless (overrides config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search the default query, then download everything in the ledger
    Scrape {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_pages: Option<u32>,
    },
    /// Search every configured keyword and write the campaign report
    Campaign {
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        limit: Option<usize>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_pages: Option<u32>,
    },
    /// Download the identifiers already in the ledger
    Download,
    /// Search one query and add the results to the ledger
    Search {
        query: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_pages: Option<u32>,
    },
    /// Open the browser, pass the gate and save fresh cookies
    Login,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    if let Err(e) = run(cli).await {
        report_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config)?;
    Overrides::from_args(&cli.params)?.apply(&mut config)?;
    if cli.headless {
        config.browser.headless = true;
    }

    let mut console = Console::stdio();
    match cli.command {
        Some(command) => run_command(command, &config, &mut console).await,
        None => run_menu(&config, &mut console).await,
    }
}

async fn run_command(command: Command, config: &Config, console: &mut Stdio) -> Result<()> {
    if let Command::Login = command {
        return login(config, console).await;
    }

    let transport = session::connect(config, console).await?;
    match command {
        Command::Scrape { max_pages } => {
            let pages = max_pages.unwrap_or(config.search.max_pages);
            full_scrape(&transport, config, pages).await
        }
        Command::Campaign { limit, max_pages } => {
            let limit = limit.unwrap_or(config.campaign.per_keyword_limit);
            let pages = max_pages.unwrap_or(config.campaign.max_pages);
            print_campaign(config, &actions::campaign(&transport, config, limit, pages).await?);
            Ok(())
        }
        Command::Download => download(&transport, config).await,
        Command::Search { query, max_pages } => {
            let pages = max_pages.unwrap_or(config.search.max_pages);
            search(&transport, config, &query, pages).await
        }
        Command::Login => Ok(()),
    }
}

const MENU: &[(&str, &str)] = &[
    ("1", "Full scrape (default search + download)"),
    ("2", "Keyword campaign"),
    ("3", "Download identifiers from the ledger"),
    ("4", "Custom search"),
    ("5", "Log in again (refresh cookies)"),
    ("0", "Quit"),
];

async fn run_menu(config: &Config, console: &mut Stdio) -> Result<()> {
    println!("gatefetch: {}", config.site.base_url);
    let mut transport: Option<HttpTransport> = None;

    loop {
        let Some(choice) = console.menu("What would you like to do?", MENU)? else {
            return Ok(());
        };
        if choice == "0" {
            return Ok(());
        }
        if choice == "5" {
            transport = None;
            login(config, console).await?;
            continue;
        }

        // Setup failures end the program; action failures return to the menu.
        let active = match transport.take() {
            Some(t) => t,
            None => session::connect(config, console).await?,
        };
        let outcome = match choice.as_str() {
            "1" => {
                let pages = console.ask_count("Max pages", config.search.max_pages)?;
                full_scrape(&active, config, pages).await
            }
            "2" => {
                let limit =
                    console.ask_count("Results per keyword", config.campaign.per_keyword_limit)?;
                let pages = console.ask_count("Max pages per keyword", config.campaign.max_pages)?;
                actions::campaign(&active, config, limit, pages)
                    .await
                    .map(|report| print_campaign(config, &report))
            }
            "3" => download(&active, config).await,
            _ => {
                let query = console.ask_text("Search query", &config.search.query)?;
                let pages = console.ask_count("Max pages", config.search.max_pages)?;
                search(&active, config, &query, pages).await
            }
        };

        match outcome {
            Ok(()) => transport = Some(active),
            Err(e) => {
                report_error(&e);
                if !e.needs_login() {
                    transport = Some(active);
                }
            }
        }
    }
}

async fn login(config: &Config, console: &mut Stdio) -> Result<()> {
    let store = gatefetch::cookie_store(config)?;
    let cookies = Bootstrap::new(&config.site, &config.browser, &store)
        .run_default(console)
        .await?;
    println!(
        "✓ Saved {} cookies to {} and {}",
        cookies.len(),
        store.json_path().display(),
        store.text_path().display()
    );
    Ok(())
}

async fn full_scrape(transport: &HttpTransport, config: &Config, max_pages: u32) -> Result<()> {
    search(transport, config, &config.search.query, max_pages).await?;
    download(transport, config).await
}

async fn search(
    transport: &HttpTransport,
    config: &Config,
    query: &str,
    max_pages: u32,
) -> Result<()> {
    println!("Searching '{}' (up to {} pages)...", query, max_pages);
    let summary = actions::scrape(transport, config, query, max_pages).await?;
    println!(
        "✓ {} identifiers found, {} new in {}",
        summary.found,
        summary.added,
        config.paths.ledger.display()
    );
    if !summary.failed_pages.is_empty() {
        println!("  Pages skipped after errors: {:?}", summary.failed_pages);
    }
    Ok(())
}

async fn download(transport: &HttpTransport, config: &Config) -> Result<()> {
    let report = actions::download_ledger(transport, config).await?;
    if report.total == 0 {
        println!(
            "Ledger {} is empty; add identifiers or run a search first.",
            config.paths.ledger.display()
        );
        return Ok(());
    }
    print_download(config, &report);
    Ok(())
}

fn print_download(config: &Config, report: &DownloadReport) {
    println!();
    println!("Download summary");
    println!("  Total:      {}", report.total);
    println!("  Downloaded: {}", report.succeeded.len());
    println!("  Skipped:    {}", report.skipped.len());
    println!("  Failed:     {}", report.failed.len());
    for failure in &report.failed {
        println!("    - {} ({:?})", failure.id, failure.kind);
    }
    if report.auth_denied() > 0 {
        println!("  Some files hit the age gate; choose 'Log in again' and re-run the download.");
    }
    println!("  Summary: {}", config.paths.summary_path().display());
}

fn print_campaign(config: &Config, report: &CampaignReport) {
    println!();
    println!("Campaign summary");
    for entry in &report.keywords {
        println!(
            "  {:<20} {} kept of {} found",
            entry.keyword, entry.count, entry.found
        );
    }
    if let Some(ref aborted) = report.aborted {
        println!("✗ Stopped at '{}': {}", aborted.keyword, aborted.reason);
    }
    println!(
        "  {} identifiers, report: {}",
        report.total_identifiers(),
        config.paths.report_path().display()
    );
}

fn report_error(e: &gatefetch::Error) {
    eprintln!("✗ {}", e);
    if e.needs_login() {
        eprintln!("  Run `gatefetch login` (menu option 5) to refresh the cookies.");
    }
}
