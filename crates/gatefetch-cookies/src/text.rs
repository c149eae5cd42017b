//! Plain-text cookie formats.
//!
//! The reader understands three line shapes, mixed freely:
//!
//! - `name=value`
//! - DevTools rows copied from the cookie table (`name<TAB>value<TAB>domain...`)
//! - Netscape cookie-file rows (`domain<TAB>flag<TAB>path<TAB>secure<TAB>expiry<TAB>name<TAB>value`)
//!
//! A `# domain: <d>` comment sets the domain for the `name=value` lines that
//! follow it. Other comments and blank lines are ignored.

use crate::{Cookie, CookieSet, Error, Result};

const DOMAIN_DIRECTIVE: &str = "# domain:";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Parse plain-text cookie content.
pub fn parse(content: &str, default_domain: &str) -> Result<CookieSet> {
    let mut set = CookieSet::new();
    let mut current_domain = default_domain.to_string();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(domain) = line.strip_prefix(DOMAIN_DIRECTIVE) {
            current_domain = domain.trim().to_string();
            continue;
        }

        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None if line.starts_with('#') => continue,
            None => (line, false),
        };

        if line.contains('\t') {
            let fields: Vec<&str> = line.split('\t').collect();
            if let Some(mut cookie) = parse_netscape_row(&fields) {
                cookie.http_only = http_only;
                set.insert(cookie);
            } else if let Some(cookie) = parse_devtools_row(&fields, default_domain) {
                set.insert(cookie);
            } else if !is_header_row(&fields) {
                return Err(Error::Syntax {
                    line: line_no,
                    reason: "tab-separated row without name and value".into(),
                });
            }
        } else if let Some((name, value)) = line.split_once('=') {
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() {
                return Err(Error::Syntax {
                    line: line_no,
                    reason: "empty cookie name".into(),
                });
            }
            set.insert(Cookie::new(name, value, current_domain.clone()));
        } else {
            return Err(Error::Syntax {
                line: line_no,
                reason: format!("expected name=value, got '{}'", line),
            });
        }
    }

    Ok(set)
}

fn parse_netscape_row(fields: &[&str]) -> Option<Cookie> {
    if fields.len() < 7 {
        return None;
    }
    let flag = fields[1].trim();
    if flag != "TRUE" && flag != "FALSE" {
        return None;
    }
    let name = fields[5].trim();
    if name.is_empty() {
        return None;
    }
    let expires = fields[4].trim().parse::<i64>().ok().filter(|s| *s > 0);
    Some(Cookie {
        name: name.to_string(),
        value: fields[6].trim().to_string(),
        domain: fields[0].trim().to_string(),
        path: fields[2].trim().to_string(),
        expires,
        secure: fields[3].trim() == "TRUE",
        http_only: false,
    })
}

fn is_header_row(fields: &[&str]) -> bool {
    let first = fields.first().map(|f| f.trim().to_ascii_lowercase());
    matches!(first.as_deref(), Some("name") | Some("cookie name") | Some(""))
}

fn parse_devtools_row(fields: &[&str], default_domain: &str) -> Option<Cookie> {
    if fields.len() < 2 || is_header_row(fields) {
        return None;
    }
    let name = fields[0].trim();
    let value = fields[1].trim();
    if name.is_empty() || value.is_empty() {
        return None;
    }
    let domain = fields
        .iter()
        .take(5)
        .skip(2)
        .map(|f| f.trim())
        .find(|f| f.starts_with('.') || (f.contains('.') && !f.contains('/')))
        .map(|f| {
            if f.starts_with('.') {
                f.to_string()
            } else {
                format!(".{}", f)
            }
        })
        .unwrap_or_else(|| default_domain.to_string());
    Some(Cookie::new(name, value, domain))
}

/// Write `name=value` lines, grouped by domain.
pub fn to_string(set: &CookieSet) -> String {
    let mut domains: Vec<&str> = Vec::new();
    for cookie in set.iter() {
        if !domains.contains(&cookie.domain.as_str()) {
            domains.push(&cookie.domain);
        }
    }

    let mut out = String::from("# gatefetch cookies (name=value)\n");
    for domain in domains {
        out.push_str(&format!("{} {}\n", DOMAIN_DIRECTIVE, domain));
        for cookie in set.iter().filter(|c| c.domain == domain) {
            out.push_str(&format!("{}={}\n", cookie.name, cookie.value));
        }
    }
    out
}

/// Write a Netscape cookie file, the format `yt-dlp --cookies` and curl read.
pub fn to_netscape(set: &CookieSet) -> String {
    let mut out = String::from("# Netscape HTTP Cookie File\n");
    for c in set.iter() {
        let prefix = if c.http_only { HTTP_ONLY_PREFIX } else { "" };
        let include_subdomains = if c.domain.starts_with('.') { "TRUE" } else { "FALSE" };
        let secure = if c.secure { "TRUE" } else { "FALSE" };
        out.push_str(&format!(
            "{}{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            prefix,
            c.domain,
            include_subdomains,
            c.path,
            secure,
            c.expires.unwrap_or(0),
            c.name,
            c.value
        ));
    }
    out
}
