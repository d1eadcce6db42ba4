//! Masking helpers for values that must never reach the logs in clear text
//!
//! Cookie values, session ids embedded in URLs, student ids and anti-forgery
//! tokens are all credentials in the eyes of the portals.

use once_cell::sync::Lazy;
use regex::Regex;

static COOKIE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"=([^;]+)").unwrap());
static STUDENT_ID_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"masv=\d+").unwrap());
static JSESSIONID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)jsessionid=[^&;/]+").unwrap());
static SESSION_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)SESSION=[^&;]+").unwrap());

/// Keep the first `show_chars` characters and replace the rest with `...`
pub fn mask_sensitive(value: &str, show_chars: usize) -> String {
    if value.chars().count() <= show_chars {
        return "***".to_string();
    }
    let prefix: String = value.chars().take(show_chars).collect();
    format!("{}...", prefix)
}

/// Mask a student id, keeping the first three and last two digits
pub fn mask_student_id(student_id: &str) -> String {
    let chars: Vec<char> = student_id.chars().collect();
    if chars.len() <= 5 {
        return "***".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Hide cookie values but keep cookie names, e.g. `SESSION=***; lang=***`
pub fn mask_cookie(cookie_header: &str) -> String {
    if cookie_header.is_empty() {
        return "(empty)".to_string();
    }
    COOKIE_VALUE.replace_all(cookie_header, "=***").into_owned()
}

/// Hide student ids and session ids carried in a URL
pub fn mask_url(url: &str) -> String {
    let url = STUDENT_ID_PARAM.replace_all(url, "masv=***");
    let url = JSESSIONID_PARAM.replace_all(&url, "jsessionid=***");
    SESSION_PARAM.replace_all(&url, "SESSION=***").into_owned()
}
