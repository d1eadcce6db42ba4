//! Course search results (`searchMonHocDangKy` fragment)

use campusgate_core::records::SearchHit;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::parse_credits;

static HIT_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"<tr\s+id='monHoc(\d+)'[^>]*onclick='getThongTinNhomLopMonHoc\([^,]+,\s*(\d+)\)'[^>]*>",
        r#"[\s\S]*?<td class="item_list">(\d+)\s*</td>"#,
        r"[\s\S]*?<td class='item_list'\s*>([A-Z0-9]+)\s*</td>",
        r"\s*<td class='item_list'\s*>([^<]+)</td>",
        r"\s*<td class='item_list'\s*>([\d.]+)</td>",
    ))
    .unwrap()
});

/// Parse the rows of a course search; rows missing any column are skipped
pub fn parse_search_results_html(html: &str) -> Vec<SearchHit> {
    HIT_ROW
        .captures_iter(html)
        .filter_map(|caps| {
            Some(SearchHit {
                internal_course_id: caps[1].to_string(),
                internal_group_id: caps[2].to_string(),
                sequence_number: caps[3].parse().ok()?,
                code: caps[4].trim().to_string(),
                name: caps[5].trim().to_string(),
                credits: parse_credits(&caps[6]),
            })
        })
        .collect()
}
