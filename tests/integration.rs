//! Browser-backed tests for the login session.
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

use gatefetch::bootstrap::{EokaLauncher, GateLauncher, GateSession as _};
use gatefetch::BrowserConfig;
use std::path::PathBuf;

/// Installed Chrome, if any
fn chrome() -> Option<PathBuf> {
    eoka::stealth::patcher::find_chrome().ok()
}

fn headless() -> BrowserConfig {
    BrowserConfig {
        headless: true,
        settle_ms: 200,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_click_gate_by_selector() {
    let Some(chrome) = chrome() else {
        eprintln!("Chrome not found, skipping test");
        return;
    };

    let config = headless();
    let mut session = EokaLauncher
        .launch(&config, &chrome)
        .await
        .expect("Failed to launch browser");

    session
        .open(r#"data:text/html,<h1>Are you 18?</h1><button id="age-button-yes">Yes</button>"#)
        .await
        .expect("Failed to navigate");

    let clicked = session
        .click_gate(&config.gate_selectors, &config.gate_texts)
        .await
        .expect("Failed to click");
    assert!(clicked);

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_click_gate_by_text() {
    let Some(chrome) = chrome() else {
        eprintln!("Chrome not found, skipping test");
        return;
    };

    let config = headless();
    let mut session = EokaLauncher
        .launch(&config, &chrome)
        .await
        .expect("Failed to launch browser");

    session
        .open("data:text/html,<div><button>No</button><button>Yes</button></div>")
        .await
        .expect("Failed to navigate");

    let clicked = session
        .click_gate(&["button.missing".to_string()], &["Yes".to_string()])
        .await
        .expect("Failed to click");
    assert!(clicked);

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_page_without_gate() {
    let Some(chrome) = chrome() else {
        eprintln!("Chrome not found, skipping test");
        return;
    };

    let config = headless();
    let mut session = EokaLauncher
        .launch(&config, &chrome)
        .await
        .expect("Failed to launch browser");

    session
        .open("data:text/html,<p>Welcome to the library</p>")
        .await
        .expect("Failed to navigate");

    let clicked = session
        .click_gate(&config.gate_selectors, &config.gate_texts)
        .await
        .expect("Failed to click");
    assert!(!clicked);

    let cookies = session.cookies().await.expect("Failed to read cookies");
    assert!(cookies.is_empty());

    session.close().await.expect("Failed to close browser");
}
