//! Registration periods listed on the registration form page

use campusgate_core::records::{PeriodStatus, RegistrationPeriod};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::date::parse_vietnamese_date;
use crate::markup::strip_tags;

/// The form page lists every period ever opened; only the most recent ones matter
pub const MAX_PERIODS: usize = 10;

static PERIOD_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"<tr[^>]*onclick="ketQuaDangKyView\((\d+)[^"]*"[^>]*>"#,
        r"\s*<td>(\d+)</td>",
        r"\s*<td[^>]*>([^<]+)</td>",
        r"\s*<td>([\s\S]*?)</td>",
        r"\s*<td>([^<]+)</td>",
        r"\s*<td>([^<]+)</td>",
    ))
    .unwrap()
});

/// Parse the period table, computing each period's status against `now`
pub fn parse_registration_periods_html(html: &str, now: NaiveDateTime) -> Vec<RegistrationPeriod> {
    PERIOD_ROW
        .captures_iter(html)
        .filter_map(|caps| {
            let starts_at_text = caps[5].trim().to_string();
            let ends_at_text = caps[6].trim().to_string();
            let starts_at = parse_vietnamese_date(&starts_at_text);
            let ends_at = parse_vietnamese_date(&ends_at_text);

            Some(RegistrationPeriod {
                id: caps[1].parse().ok()?,
                sequence_number: caps[2].parse().ok()?,
                code: caps[3].trim().to_string(),
                description: strip_tags(&caps[4]),
                status: period_status(now, starts_at, ends_at),
                has_result: caps[4].to_lowercase().contains("kết quả"),
                starts_at_text,
                ends_at_text,
                starts_at,
                ends_at,
            })
        })
        .take(MAX_PERIODS)
        .collect()
}

/// Unparseable bounds never make a period open; a period with a known end in
/// the past is closed
fn period_status(
    now: NaiveDateTime,
    starts_at: Option<NaiveDateTime>,
    ends_at: Option<NaiveDateTime>,
) -> PeriodStatus {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) if now >= start && now <= end => PeriodStatus::Open,
        (_, Some(end)) if now > end => PeriodStatus::Closed,
        _ => PeriodStatus::Upcoming,
    }
}
