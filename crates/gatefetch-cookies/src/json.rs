//! Structured cookie format: a JSON array of cookie objects.
//!
//! Accepts the shape browsers export (`expires` as float, `-1` for session,
//! `httpOnly`) as well as what [`to_string`] writes.

use crate::{Cookie, CookieSet, Result};

/// Parse a JSON cookie array. Cookies without a domain get `default_domain`.
pub fn parse(content: &str, default_domain: &str) -> Result<CookieSet> {
    let cookies: Vec<Cookie> = serde_json::from_str(content)?;
    Ok(cookies
        .into_iter()
        .map(|mut c| {
            if c.domain.is_empty() {
                c.domain = default_domain.to_string();
            }
            c
        })
        .collect())
}

pub fn to_string(set: &CookieSet) -> Result<String> {
    let cookies: Vec<&Cookie> = set.iter().collect();
    let mut out = serde_json::to_string_pretty(&cookies)?;
    out.push('\n');
    Ok(out)
}
