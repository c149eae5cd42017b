use gatefetch_cookies::{Cookie, CookieSet, CookieStore, Error};
use std::fs;

fn store_in(dir: &std::path::Path) -> CookieStore {
    CookieStore::new(
        dir.join("cookies.json"),
        dir.join("cookies.txt"),
        ".justice.gov",
    )
}

#[test]
fn test_load_prefers_structured_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cookies.json"),
        r#"[{"name": "_ga", "value": "from-json", "domain": ".justice.gov", "path": "/"}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("cookies.txt"), "_ga=from-text\nother=1\n").unwrap();

    let set = store_in(dir.path()).load().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.get("_ga").unwrap().value, "from-json");
}

#[test]
fn test_load_falls_back_to_text_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cookies.txt"), "sid=abc\n").unwrap();

    let set = store_in(dir.path()).load().unwrap();
    assert_eq!(set.get("sid").unwrap().value, "abc");
    assert_eq!(set.get("sid").unwrap().domain, ".justice.gov");
}

#[test]
fn test_load_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    assert!(!store.exists());
    assert!(matches!(store.load(), Err(Error::NotFound(_))));
}

#[test]
fn test_malformed_structured_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cookies.json"), "{ not json").unwrap();
    fs::write(dir.path().join("cookies.txt"), "sid=abc\n").unwrap();

    match store_in(dir.path()).load() {
        Err(Error::Parse { path, .. }) => assert!(path.ends_with("cookies.json")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_save_writes_both_formats_and_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());

    let mut first = CookieSet::new();
    first.insert(Cookie::new("old", "1", ".justice.gov"));
    store.save(&first).unwrap();

    let mut second = CookieSet::new();
    second.insert(Cookie::new("_ga", "GA1.1.9", ".justice.gov").expires(1786197988));
    second.insert(Cookie::new("sid", "xyz", "www.justice.gov"));
    store.save(&second).unwrap();

    assert_eq!(store.load().unwrap(), second);

    fs::remove_file(store.json_path()).unwrap();
    let from_text = store.load().unwrap();
    assert_eq!(from_text.len(), 2);
    assert!(from_text.get("old").is_none());
    assert_eq!(from_text.get("sid").unwrap().domain, "www.justice.gov");
}

#[test]
fn test_netscape_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    let mut set = CookieSet::new();
    set.insert(Cookie::new("sid", "xyz", ".justice.gov"));
    let path = dir.path().join("netscape.txt");
    store.export_netscape(&set, &path).unwrap();

    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains(".justice.gov\tTRUE\t/\tFALSE\t0\tsid\txyz"));
}
