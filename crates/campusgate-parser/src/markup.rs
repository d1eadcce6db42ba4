//! Small helpers shared by the table parsers

use once_cell::sync::Lazy;
use regex::Regex;

static ITEM_LIST_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<td class='item_list'[^>]*>(.*?)</td>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TABLE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap());

/// Trimmed inner HTML of every `<td class='item_list'>` cell, in order
pub(crate) fn item_list_cells(html: &str) -> Vec<String> {
    ITEM_LIST_CELL
        .captures_iter(html)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Every `<tr>…</tr>` of a fragment, outer HTML included
pub(crate) fn table_rows(html: &str) -> impl Iterator<Item = &str> {
    TABLE_ROW.find_iter(html).map(|m| m.as_str())
}

/// Remove tags and trim
pub(crate) fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").trim().to_string()
}

/// Collapse runs of whitespace to one space and trim
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Integer value of the leading digits, `None` when there are none
pub(crate) fn leading_number(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Decimal value of a credits column; unparseable text counts as zero
pub(crate) fn parse_credits(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(0.0)
}
