//! End-to-end workflows against a scripted site.

use async_trait::async_trait;
use gatefetch::{actions, Config, Error, HttpResponse, Ledger, Result, SearchClient, Transport};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&str) -> Result<HttpResponse> + Send + Sync>;

/// Records every requested URL and answers from a handler.
struct MockSite {
    handler: Handler,
    requested: Mutex<Vec<String>>,
}

impl MockSite {
    fn new(handler: impl Fn(&str) -> Result<HttpResponse> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockSite {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requested.lock().unwrap().push(url.to_string());
        (self.handler)(url)
    }
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.download_dir = dir.join("downloads");
    config.paths.ledger = dir.join("file_ids.txt");
    config.download.delay_ms = 0;
    config
}

fn page_of(url: &str) -> usize {
    url.rsplit("page=")
        .next()
        .and_then(|n| n.split('&').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Result page listing `ids`, with a Next link unless it is the last page.
fn results_page(url: &str, ids: &[String], next: bool) -> HttpResponse {
    let mut body = String::from("<html><body><ul>");
    for id in ids {
        body.push_str(&format!("<li><a href=\"/epstein/files/{id}.pdf\">{id}.pdf</a></li>"));
    }
    body.push_str("</ul>");
    if next {
        body.push_str(&format!("<a href=\"?keys=q&page={}\">Next</a>", page_of(url) + 1));
    }
    body.push_str("</body></html>");
    HttpResponse::new(200, url, body).with_content_type("text/html; charset=UTF-8")
}

#[tokio::test]
async fn test_download_skips_existing_and_fetches_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::write(&config.paths.ledger, "EFTA001\nEFTA002\n").unwrap();
    let pdf_dir = config.paths.download_dir.join("pdf");
    fs::create_dir_all(&pdf_dir).unwrap();
    fs::write(pdf_dir.join("EFTA001.pdf"), b"0123456789").unwrap();

    let site = MockSite::new(|url| {
        Ok(HttpResponse::new(200, url, "%PDF-1.7 body").with_content_type("application/pdf"))
    });
    let report = actions::download_ledger(&site, &config).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.skipped, vec!["EFTA001"]);
    assert_eq!(report.succeeded, vec!["EFTA002"]);
    assert!(report.failed.is_empty());

    let requested = site.requested();
    assert_eq!(requested.len(), 1);
    assert!(requested[0].ends_with("/EFTA002.pdf"));
    assert_eq!(fs::read(pdf_dir.join("EFTA001.pdf")).unwrap(), b"0123456789");
    assert_eq!(fs::read(pdf_dir.join("EFTA002.pdf")).unwrap(), b"%PDF-1.7 body");
    assert!(config.paths.summary_path().exists());
}

#[tokio::test]
async fn test_download_with_empty_ledger_writes_template() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let site = MockSite::new(|url| Ok(HttpResponse::new(500, url, "")));

    let report = actions::download_ledger(&site, &config).await.unwrap();
    assert_eq!(report.total, 0);
    assert!(site.requested().is_empty());
    assert!(fs::read_to_string(&config.paths.ledger)
        .unwrap()
        .starts_with('#'));
}

#[tokio::test]
async fn test_search_requests_at_most_max_pages() {
    let site = MockSite::new(|url| {
        let id = format!("EFTA{:08}", page_of(url));
        Ok(results_page(url, &[id], true))
    });
    let client = SearchClient::new(&site, &Config::default().site).unwrap();

    let result = client.search("q", 3).await.unwrap();
    assert_eq!(site.requested().len(), 3);
    assert_eq!(
        result.ids(),
        vec!["EFTA00000000", "EFTA00000001", "EFTA00000002"]
    );
}

#[tokio::test]
async fn test_search_skips_failed_page_and_continues() {
    let site = MockSite::new(|url| {
        let page = page_of(url);
        if page == 1 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )));
        }
        let id = format!("EFTA{:08}", page);
        Ok(results_page(url, &[id], page < 4))
    });
    let client = SearchClient::new(&site, &Config::default().site).unwrap();

    let result = client.search("q", 5).await.unwrap();
    assert_eq!(site.requested().len(), 5);
    assert_eq!(result.failed_pages, vec![2]);
    assert_eq!(
        result.ids(),
        vec!["EFTA00000000", "EFTA00000002", "EFTA00000003", "EFTA00000004"]
    );
}

#[tokio::test]
async fn test_campaign_stops_at_expired_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.campaign.keywords = vec!["alpha".into(), "beta".into(), "gamma".into()];

    let site = MockSite::new(|url| {
        if url.contains("keys=alpha") {
            let ids: Vec<String> = (1..=5).map(|n| format!("EFTA{:08}", n)).collect();
            Ok(results_page(url, &ids, false))
        } else {
            Ok(HttpResponse::new(403, url, "Forbidden"))
        }
    });

    let report = actions::campaign(&site, &config, 2, 3).await.unwrap();

    assert_eq!(report.keywords.len(), 1);
    let alpha = report.entry("alpha").unwrap();
    assert_eq!(alpha.identifiers, vec!["EFTA00000001", "EFTA00000002"]);
    assert_eq!(alpha.count, 2);
    assert_eq!(alpha.found, 5);
    assert!(report.entry("beta").is_none());
    assert_eq!(report.aborted.as_ref().unwrap().keyword, "beta");
    assert!(!site.requested().iter().any(|u| u.contains("keys=gamma")));

    let ledger = Ledger::new(&config.paths.ledger).read_all().unwrap();
    assert_eq!(ledger.len(), 2);

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.paths.report_path()).unwrap()).unwrap();
    assert_eq!(saved["keywords"][0]["keyword"], "alpha");
    assert_eq!(saved["aborted"]["keyword"], "beta");
}

#[tokio::test]
async fn test_campaign_keeps_report_when_ledger_breaks() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.campaign.keywords = vec!["alpha".into(), "beta".into(), "gamma".into()];

    let ledger_path = config.paths.ledger.clone();
    let site = MockSite::new(move |url| {
        if url.contains("keys=beta") {
            // the ledger becomes unreadable before beta's results are appended
            fs::remove_file(&ledger_path).unwrap();
            fs::create_dir(&ledger_path).unwrap();
        }
        let id = if url.contains("keys=alpha") { "EFTA00000001" } else { "EFTA00000002" };
        Ok(results_page(url, &[id.to_string()], false))
    });

    let err = actions::campaign(&site, &config, 5, 1).await.unwrap_err();
    assert!(matches!(err, Error::Ledger { .. }));
    assert!(!site.requested().iter().any(|u| u.contains("keys=gamma")));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.paths.report_path()).unwrap()).unwrap();
    assert_eq!(saved["keywords"].as_array().unwrap().len(), 1);
    assert_eq!(saved["keywords"][0]["identifiers"][0], "EFTA00000001");
    assert_eq!(saved["aborted"]["keyword"], "beta");
}

#[tokio::test]
async fn test_scrape_twice_leaves_ledger_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let site = MockSite::new(|url| {
        let ids = vec!["EFTA00000010".to_string(), "EFTA00000011".to_string()];
        Ok(results_page(url, &ids, false))
    });

    let first = actions::scrape(&site, &config, "q", 2).await.unwrap();
    assert_eq!(first.added, 2);
    let bytes = fs::read(&config.paths.ledger).unwrap();

    let second = actions::scrape(&site, &config, "q", 2).await.unwrap();
    assert_eq!(second.found, 2);
    assert_eq!(second.added, 0);
    assert_eq!(fs::read(&config.paths.ledger).unwrap(), bytes);
}

#[tokio::test]
async fn test_scrape_surfaces_gate_as_auth_expired() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let site = MockSite::new(|url| {
        Ok(HttpResponse::new(
            200,
            url,
            "<!DOCTYPE html><html><h1>Age verification</h1><button id=\"age-button-yes\">Yes</button></html>",
        ))
    });

    let err = actions::scrape(&site, &config, "q", 2).await.unwrap_err();
    assert!(matches!(err, Error::AuthExpired(_)));
    assert!(err.needs_login());
    assert!(!config.paths.ledger.exists());
}
