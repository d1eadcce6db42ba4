//! Class groups of a course (`getThongTinNhomLopMonHoc` fragment)
//!
//! The fragment lists one block per group, separated by `<hr>`. Each block
//! opens with a header row of nine `item_list` cells:
//!
//! | # | Content |
//! |---|---------|
//! | 0 | group code |
//! | 1 | `registered/capacity` |
//! | 2 | language |
//! | 3 | lecture group |
//! | 4 | lecturer |
//! | 5 | practice group |
//! | 6 | practice lecturer |
//! | 7 | max lecture slots |
//! | 8 | register control, empty when the group cannot be picked |
//!
//! followed by a nested `class='table'` holding the weekly schedule.

use campusgate_core::records::{ClassGroup, ScheduleEntry};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::{item_list_cells, leading_number, strip_tags, table_rows};

const HEADER_CELLS: usize = 9;
const SCHEDULE_CELLS: usize = 6;

static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<hr\s*/?>").unwrap());
static HEADER_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<tr[^>]*style="border-bottom:2px #ccc\s+solid;"[^>]*>(.*?)</tr>"#).unwrap()
});
static SLOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)/(\d+)").unwrap());
static REGISTER_CONTROL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"dangKyNhomLopMonHoc\s*\(\s*this\s*,\s*(\d+)\s*,\s*(\d+)\s*\)").unwrap()
});
static SCHEDULE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<table[^>]*class=['"]table['"][^>]*>(.*?)</table>"#).unwrap()
});
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Parse every class group of the fragment; blocks that do not look like a
/// group are skipped
pub fn parse_class_groups_html(html: &str) -> Vec<ClassGroup> {
    BLOCK_SEPARATOR
        .split(html)
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<ClassGroup> {
    let header = HEADER_ROW.captures(block)?;
    let cells = item_list_cells(&header[1]);
    if cells.len() < HEADER_CELLS {
        return None;
    }

    let slots = SLOTS.captures(&cells[1])?;
    let registered_count: u32 = slots[1].parse().ok()?;
    let capacity: u32 = slots[2].parse().ok()?;
    let is_full = registered_count >= capacity;

    let control = REGISTER_CONTROL.captures(&cells[8]);
    let (internal_group_id, internal_course_id) = match &control {
        Some(caps) => (Some(caps[1].to_string()), Some(caps[2].to_string())),
        None => (None, None),
    };

    let language = strip_tags(&cells[2]);

    Some(ClassGroup {
        group_code: strip_tags(&cells[0]),
        registered_count,
        capacity,
        language: if language.is_empty() {
            "V".to_string()
        } else {
            language
        },
        lecture_group: strip_tags(&cells[3]),
        lecturer: strip_tags(&cells[4]),
        practice_group: strip_tags(&cells[5]),
        practice_lecturer: strip_tags(&cells[6]),
        max_lecture_slots: leading_number(&cells[7]).unwrap_or(0),
        can_register: !is_full && control.is_some(),
        is_full,
        internal_group_id,
        internal_course_id,
        schedules: parse_schedule_table(block),
    })
}

fn parse_schedule_table(block: &str) -> Vec<ScheduleEntry> {
    let Some(table) = SCHEDULE_TABLE.captures(block) else {
        return Vec::new();
    };

    table_rows(&table[1])
        .filter(|row| !row.contains("<th") && !row.contains("border-bottom:2px"))
        .filter_map(|row| {
            let cells = item_list_cells(row);
            if cells.len() < SCHEDULE_CELLS {
                return None;
            }

            let day_label = strip_tags(&cells[0]);
            let periods: Vec<&str> = DIGITS.find_iter(&cells[1]).map(|m| m.as_str()).collect();
            if day_label.is_empty() && periods.is_empty() {
                return None;
            }

            Some(ScheduleEntry {
                day_label,
                period_range: if periods.is_empty() {
                    "-".to_string()
                } else {
                    periods.join(", ")
                },
                room: strip_tags(&cells[2]),
                campus_code: strip_tags(&cells[3]),
                lab_group: strip_tags(&cells[4]),
                week_range: strip_tags(&cells[5]),
            })
        })
        .collect()
}
