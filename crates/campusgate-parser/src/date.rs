//! Vietnamese date format (`dd/mm/yyyy hh:mm`)

use chrono::{NaiveDate, NaiveDateTime};

/// Parse `dd/mm/yyyy` with an optional `hh:mm` suffix.
///
/// The time defaults to midnight. Empty input, garbled input and calendar
/// values out of range (31/02, 25:00, ...) all yield `None`.
pub fn parse_vietnamese_date(text: &str) -> Option<NaiveDateTime> {
    let mut parts = text.split_whitespace();
    let date_part = parts.next()?;
    let time_part = parts.next();

    let mut date_fields = date_part.split('/');
    let day: u32 = date_fields.next()?.parse().ok()?;
    let month: u32 = date_fields.next()?.parse().ok()?;
    let year: i32 = date_fields.next()?.parse().ok()?;
    if date_fields.next().is_some() {
        return None;
    }

    let (hour, minute) = match time_part {
        Some(time) => {
            let (hour, minute) = time.split_once(':')?;
            (hour.parse().ok()?, minute.parse().ok()?)
        }
        None => (0, 0),
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}
