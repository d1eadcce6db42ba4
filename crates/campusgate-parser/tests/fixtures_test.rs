//! Parser tests against captured registration portal fragments

use campusgate_core::records::PeriodStatus;
use campusgate_parser::{
    parse_class_groups_html, parse_period_details_html, parse_registration_periods_html,
    parse_schedule_html, parse_search_results_html, parse_vietnamese_date,
};

const CLASS_GROUPS: &str = include_str!("fixtures/class_groups.html");
const SEARCH_RESULTS: &str = include_str!("fixtures/search_results.html");
const SCHEDULE: &str = include_str!("fixtures/schedule.html");
const PERIOD_DETAILS: &str = include_str!("fixtures/period_details.html");
const PERIODS: &str = include_str!("fixtures/periods.html");

#[test]
fn test_class_groups_fixture() {
    let groups = parse_class_groups_html(CLASS_GROUPS);
    assert_eq!(groups.len(), 2);

    let open = &groups[0];
    assert_eq!(open.group_code, "L01");
    assert_eq!((open.registered_count, open.capacity), (38, 40));
    assert_eq!(open.lecturer, "Nguyễn Văn An");
    assert_eq!(open.max_lecture_slots, 80);
    assert!(open.can_register);
    assert_eq!(open.internal_group_id.as_deref(), Some("1504321"));
    assert_eq!(open.internal_course_id.as_deref(), Some("88123"));

    assert_eq!(open.schedules.len(), 2);
    assert_eq!(open.schedules[0].day_label, "Thứ 2");
    assert_eq!(open.schedules[0].period_range, "2, 3, 4");
    assert_eq!(open.schedules[0].room, "H6-112");
    assert_eq!(open.schedules[0].week_range, "--|--|04|05|06|07|08|09|");
    assert_eq!(open.schedules[1].period_range, "8, 9");
    assert_eq!(open.schedules[1].lab_group, "L01");

    let full = &groups[1];
    assert!(full.is_full);
    assert!(!full.can_register);
    assert_eq!(full.language, "V");
    assert!(full.schedules.is_empty());
}

#[test]
fn test_search_results_fixture() {
    let hits = parse_search_results_html(SEARCH_RESULTS);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].code, "CO2003");
    assert_eq!(hits[0].internal_course_id, "88123");
    assert_eq!(hits[0].sequence_number, 1);
    assert_eq!(hits[2].name, "Triết học Mác - Lênin");
    assert_eq!(hits[2].credits, 3.0);
}

#[test]
fn test_schedule_fixture() {
    let window = parse_schedule_html(SCHEDULE);
    assert!(window.is_open);
    assert_eq!(window.opens_at, "06/01/2025 08:00");
    assert_eq!(window.closes_at, "12/01/2025 23:59");
}

#[test]
fn test_period_details_fixture() {
    let summary = parse_period_details_html(PERIOD_DETAILS);
    assert_eq!(summary.courses.len(), 2);
    assert_eq!(summary.total_credits, 7.0);
    assert_eq!(summary.total_courses, 2);

    let editable = &summary.courses[0];
    assert_eq!(editable.code, "CO2003");
    assert_eq!(editable.name, "Cấu trúc dữ liệu và giải thuật");
    assert_eq!(editable.credits, 4.0);
    assert_eq!(editable.entry_id.as_deref(), Some("7001"));
    assert!(!editable.is_locked);
    assert!(editable.can_delete);

    let group = editable.group.as_ref().expect("group row");
    assert_eq!(group.group_code, "L01");
    assert_eq!(group.registered, "39/40");
    assert_eq!(group.capacity, "40");
    assert_eq!(editable.schedules.len(), 1);
    assert_eq!(editable.schedules[0].period_range, "2 3 4");

    let locked = &summary.courses[1];
    assert_eq!(locked.code, "SP1031");
    assert_eq!(locked.entry_id.as_deref(), Some("7002"));
    assert!(locked.is_locked);
    assert!(!locked.can_delete);
    assert_eq!(
        locked.group.as_ref().map(|g| g.lecturer.as_str()),
        Some("Chưa phân công")
    );
}

#[test]
fn test_periods_fixture() {
    let now = parse_vietnamese_date("08/01/2025 10:00").expect("valid date");
    let periods = parse_registration_periods_html(PERIODS, now);

    assert_eq!(periods.len(), 3);
    assert_eq!(periods[0].id, 633);
    assert_eq!(periods[0].code, "20242");
    assert_eq!(periods[0].description, "Đăng ký môn học HK2/2024-2025");
    assert_eq!(periods[0].status, PeriodStatus::Open);
    assert_eq!(periods[1].status, PeriodStatus::Closed);
    assert!(periods[1].has_result);
    assert_eq!(periods[2].status, PeriodStatus::Upcoming);
}

#[test]
fn test_records_serialize_for_the_boundary() {
    let summary = parse_period_details_html(PERIOD_DETAILS);
    let json = serde_json::to_value(&summary).expect("serializable");
    assert_eq!(json["totalCredits"], 7.0);
    assert_eq!(json["courses"][0]["canDelete"], true);
    assert_eq!(json["courses"][1]["isLocked"], true);
}
