//! Domain records extracted from registration portal responses
//!
//! Every record here is a plain value built fresh by the parser for a single
//! call. Field names serialize as camelCase for the HTTP boundary.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One weekly meeting of a class group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// Day label as printed by the portal ("Thứ 2", "CN", ...)
    pub day_label: String,
    /// Lesson periods, e.g. "7, 8, 9" or "-" when the portal printed none
    pub period_range: String,
    pub room: String,
    pub campus_code: String,
    /// BT/TN (exercise/lab) group column
    pub lab_group: String,
    /// Teaching weeks, tags stripped
    pub week_range: String,
}

/// One registration group of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub group_code: String,
    pub registered_count: u32,
    pub capacity: u32,
    pub language: String,
    pub lecture_group: String,
    pub lecturer: String,
    pub practice_group: String,
    pub practice_lecturer: String,
    pub max_lecture_slots: u32,
    pub can_register: bool,
    pub is_full: bool,
    /// Registration-group id passed to the register action
    pub internal_group_id: Option<String>,
    pub internal_course_id: Option<String>,
    pub schedules: Vec<ScheduleEntry>,
}

/// A course matching a search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub internal_course_id: String,
    pub internal_group_id: String,
    pub sequence_number: u32,
    pub code: String,
    pub name: String,
    pub credits: f64,
}

/// Registration window of a period.
///
/// `opens_at`/`closes_at` keep the raw portal text and are empty strings when
/// the portal printed no date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationWindow {
    pub opens_at: String,
    pub closes_at: String,
    pub is_open: bool,
}

/// Group details printed inside a registered course's panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredGroup {
    pub group_code: String,
    /// Registered-count text as printed ("35/40")
    pub registered: String,
    pub capacity: String,
    pub language: String,
    pub lecture_group: String,
    pub lecturer: String,
    pub practice_group: String,
    pub practice_lecturer: String,
}

/// A course already registered in a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredCourse {
    pub sequence_number: u32,
    pub code: String,
    pub name: String,
    pub credits: f64,
    pub is_locked: bool,
    pub can_delete: bool,
    /// Registration-entry id used by the edit and delete actions
    pub entry_id: Option<String>,
    pub group: Option<RegisteredGroup>,
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub courses: Vec<RegisteredCourse>,
    pub total_credits: f64,
    pub total_courses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Upcoming,
    Open,
    Closed,
}

/// A registration period listed on the registration form page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPeriod {
    pub id: u64,
    pub sequence_number: u32,
    pub code: String,
    pub description: String,
    pub starts_at_text: String,
    pub ends_at_text: String,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub status: PeriodStatus,
    pub has_result: bool,
}

/// Registration round ids the portal attaches to a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundIds {
    pub round_student_id: String,
    pub round_id: String,
}

/// Reply of the portal to a register action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub success: bool,
    pub message: String,
    pub code: Option<String>,
    /// Set when the request was fired without priming or confirmation
    pub forced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationOutcome {
    pub success: bool,
    pub entry_id: String,
    pub message: String,
}

/// Everything loaded when a period is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodOverview {
    pub period_id: String,
    pub round_id: String,
    pub summary: PeriodSummary,
    pub window: RegistrationWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_serialize_camel_case() {
        let hit = SearchHit {
            internal_course_id: "123".to_string(),
            internal_group_id: "456".to_string(),
            sequence_number: 1,
            code: "MT1003".to_string(),
            name: "Giải tích 1".to_string(),
            credits: 4.0,
        };

        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["internalCourseId"], "123");
        assert_eq!(json["sequenceNumber"], 1);
    }

    #[test]
    fn test_period_status_serializes_lowercase() {
        let json = serde_json::to_string(&PeriodStatus::Open).unwrap();
        assert_eq!(json, "\"open\"");
    }
}
