//! Bearer token discovery in the student app's landing page
//!
//! The app does not hand out its API token explicitly; it is embedded in the
//! HTML in one of several ways depending on the app release. Extractors are
//! tried in order and the first hit wins.

use once_cell::sync::Lazy;
use regex::Regex;

struct Extractor {
    name: &'static str,
    pattern: Regex,
}

static EXTRACTORS: Lazy<Vec<Extractor>> = Lazy::new(|| {
    vec![
        Extractor {
            name: "hidden input",
            pattern: Regex::new(r#"id="hid_Token"\s+value="([^"]+)""#).unwrap(),
        },
        Extractor {
            name: "localStorage",
            pattern: Regex::new(
                r#"localStorage\.setItem\(['"]token['"]\s*,\s*['"]([^'"]+)['"]"#,
            )
            .unwrap(),
        },
        Extractor {
            name: "window.token",
            pattern: Regex::new(r#"window\.token\s*=\s*['"]([^'"]+)['"]"#).unwrap(),
        },
        Extractor {
            name: "raw JWT",
            pattern: Regex::new(r"(eyJ[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+)")
                .unwrap(),
        },
    ]
});

/// Find the API token in `html`, returning the extractor name with it
pub fn extract_bearer_token(html: &str) -> Option<(&'static str, String)> {
    EXTRACTORS.iter().find_map(|extractor| {
        extractor
            .pattern
            .captures(html)
            .map(|caps| (extractor.name, caps[1].to_string()))
    })
}

/// Strip an optional `Bearer ` scheme from an authorization value
pub fn strip_bearer_scheme(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
}
