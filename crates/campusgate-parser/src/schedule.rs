//! Registration window of a period (`getLichDangKy` fragment)

use campusgate_core::records::RegistrationWindow;
use once_cell::sync::Lazy;
use regex::Regex;

static OPEN_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"id="hdTrongHanDK"\s+value="(\w+)""#).unwrap());
static DATE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}").unwrap());

/// The first two date-times of the fragment are the opening and closing
/// times; either is an empty string when missing
pub fn parse_schedule_html(html: &str) -> RegistrationWindow {
    let mut dates = DATE_TIME.find_iter(html).map(|m| m.as_str().to_string());

    RegistrationWindow {
        opens_at: dates.next().unwrap_or_default(),
        closes_at: dates.next().unwrap_or_default(),
        is_open: OPEN_FLAG
            .captures(html)
            .is_some_and(|caps| &caps[1] == "true"),
    }
}
