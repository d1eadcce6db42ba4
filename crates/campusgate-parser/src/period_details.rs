//! Registered courses of a period (`getKetQuaDangKy` / `ketQuaDangKyView` fragments)
//!
//! Each registered course is printed as a `col-md-1` / `col-md-8` / `col-md-1`
//! triplet (sequence, `CODE - name` plus edit/delete controls, credits),
//! followed by a panel with the chosen group and its schedule. The page ends
//! with the credit and course totals.

use campusgate_core::records::{PeriodSummary, RegisteredCourse, RegisteredGroup, ScheduleEntry};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::{collapse_whitespace, item_list_cells, parse_credits, strip_tags, table_rows};

const UNASSIGNED_LECTURER: &str = "Chưa phân công";
const PANEL_BOUNDARY: &str = r#"<div class="panel panel-default">"#;
const LOCK_MARKER: &str = "fa-lock";

static COURSE_TRIPLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"<div class='col-md-1'>(\d+)</div>",
        r"[\s\S]*?<div class='col-md-8'>([\s\S]*?)</div>",
        r"[\s\S]*?<div class='col-md-1'>[\s\S]*?([\d.]+)[\s\S]*?</div>",
    ))
    .unwrap()
});
static CODE_AND_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]{2}\d{4})\s*-\s*([^<]+)").unwrap());
static ENTRY_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"hieuChinhKetQuaDangKyForm\((\d+)\)|xoaKetQuaDangKy\((\d+)").unwrap()
});
static TOTAL_CREDITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Tổng số tín chỉ đăng ký:\s*([\d.]+)").unwrap());
static TOTAL_COURSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Tổng số môn đăng ký:\s*(\d+)").unwrap());
static GROUP_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<tr style="border-bottom:2px[^"]*">(.*?)</tr>"#).unwrap());
static SCHEDULE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<table width="100%" class='table'>(.*?)</table>"#).unwrap());

/// One course triplet before its block boundaries are known
struct CourseMatch<'a> {
    sequence_number: u32,
    code: &'a str,
    name: &'a str,
    credits: f64,
    entry_id: Option<String>,
    /// Offset of the course code in the whole page
    code_offset: usize,
    /// Offset where the triplet match starts
    match_start: usize,
}

/// Parse the registered courses and totals of a period.
///
/// Totals are 0 when the summary lines are missing.
pub fn parse_period_details_html(html: &str) -> PeriodSummary {
    let matches: Vec<CourseMatch<'_>> = COURSE_TRIPLET
        .captures_iter(html)
        .filter_map(|caps| {
            let content = caps.get(2)?;
            let code_caps = CODE_AND_NAME.captures(content.as_str())?;
            let code = code_caps.get(1)?;
            let entry_id = ENTRY_ID.captures(content.as_str()).and_then(|ids| {
                ids.get(1)
                    .or_else(|| ids.get(2))
                    .map(|id| id.as_str().to_string())
            });

            Some(CourseMatch {
                sequence_number: caps[1].parse().ok()?,
                code: code.as_str(),
                name: code_caps.get(2)?.as_str().trim(),
                credits: parse_credits(&caps[3]),
                entry_id,
                code_offset: content.start() + code.start(),
                match_start: caps.get(0)?.start(),
            })
        })
        .collect();

    let courses = matches
        .iter()
        .enumerate()
        .map(|(index, course)| {
            let next_course = matches.get(index + 1).map(|next| next.match_start);
            let block = course_block(html, course.code_offset, next_course);
            let is_locked = block.contains(LOCK_MARKER);

            RegisteredCourse {
                sequence_number: course.sequence_number,
                code: course.code.to_string(),
                name: course.name.to_string(),
                credits: course.credits,
                is_locked,
                can_delete: course.entry_id.is_some() && !is_locked,
                entry_id: course.entry_id.clone(),
                group: parse_registered_group(block),
                schedules: parse_registered_schedule(block),
            }
        })
        .collect();

    PeriodSummary {
        courses,
        total_credits: TOTAL_CREDITS
            .captures(html)
            .map(|caps| parse_credits(&caps[1]))
            .unwrap_or(0.0),
        total_courses: TOTAL_COURSES
            .captures(html)
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(0),
    }
}

/// Markup belonging to one course: from its code up to the next panel or the
/// next course, whichever comes first
fn course_block(html: &str, code_offset: usize, next_course: Option<usize>) -> &str {
    let rest = &html[code_offset..];
    let panel_end = rest
        .get(1..)
        .and_then(|tail| tail.find(PANEL_BOUNDARY))
        .map(|offset| code_offset + 1 + offset);

    let end = match (panel_end, next_course) {
        (Some(panel), Some(next)) => panel.min(next),
        (Some(panel), None) => panel,
        (None, Some(next)) => next,
        (None, None) => html.len(),
    };

    html.get(code_offset..end.max(code_offset)).unwrap_or(rest)
}

fn parse_registered_group(block: &str) -> Option<RegisteredGroup> {
    let row = GROUP_ROW.captures(block)?;
    let cells: Vec<String> = item_list_cells(&row[1])
        .iter()
        .map(|cell| strip_tags(cell))
        .collect();
    if cells.len() < 8 {
        return None;
    }

    Some(RegisteredGroup {
        group_code: cells[0].clone(),
        registered: cells[1].clone(),
        language: cells[2].clone(),
        lecture_group: cells[3].clone(),
        lecturer: if cells[4].is_empty() {
            UNASSIGNED_LECTURER.to_string()
        } else {
            cells[4].clone()
        },
        practice_group: cells[5].clone(),
        practice_lecturer: cells[6].clone(),
        capacity: cells[7].clone(),
    })
}

fn parse_registered_schedule(block: &str) -> Vec<ScheduleEntry> {
    let Some(table) = SCHEDULE_TABLE.captures(block) else {
        return Vec::new();
    };

    table_rows(&table[1])
        .filter_map(|row| {
            let cells = item_list_cells(row);
            if cells.len() < 6 {
                return None;
            }
            let day_label = strip_tags(&cells[0]);
            if day_label.is_empty() || day_label == "Thứ" {
                return None;
            }

            Some(ScheduleEntry {
                day_label,
                period_range: collapse_whitespace(&strip_tags(&cells[1])),
                room: strip_tags(&cells[2]),
                campus_code: strip_tags(&cells[3]),
                lab_group: strip_tags(&cells[4]),
                week_range: strip_tags(&cells[5]),
            })
        })
        .collect()
}
