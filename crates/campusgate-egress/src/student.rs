//! Student app API calls (profile, timetable, exams, grades)

use crate::{EgressError, Result};
use reqwest::Method;

/// Student profile endpoint, also fetched right after the primary login
pub(crate) const PROFILE_PATH: &str = "/api/v1/student/get-student-info?null";

const VIEW_ONLINE: &str = "VIEWONLINE";

/// One student app API call with every identifier resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentApiCall {
    Info,

    /// Weekly timetable; the app picks the current semester when `semester` is absent
    Schedule {
        student_id: String,
        semester: Option<String>,
    },

    ExamSchedule {
        student_id: String,
        year: String,
        semester: String,
    },

    /// Curriculum progress and cumulative GPA
    GpaSummary { student_id: String },

    /// Grades of one semester
    GpaDetail {
        student_id: String,
        semester_id: String,
    },

    TranscriptSummary { student_id: String },
}

impl StudentApiCall {
    /// Label used for metrics and logs
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Info => "student_info",
            Self::Schedule { .. } => "student_schedule",
            Self::ExamSchedule { .. } => "exam_schedule",
            Self::GpaSummary { .. } => "gpa_summary",
            Self::GpaDetail { .. } => "gpa_detail",
            Self::TranscriptSummary { .. } => "transcript_summary",
        }
    }

    pub(crate) fn method(&self) -> Method {
        match self {
            Self::Info | Self::Schedule { .. } | Self::ExamSchedule { .. } => Method::GET,
            _ => Method::POST,
        }
    }

    /// Path and query. The app's own GET calls end their query with `&null`.
    pub(crate) fn path(&self) -> Result<String> {
        let path = match self {
            Self::Info => PROFILE_PATH.to_string(),
            Self::Schedule {
                student_id,
                semester,
            } => {
                let mut query = vec![("studentId", student_id.as_str())];
                if let Some(semester) = semester {
                    query.push(("semesterYear", semester.as_str()));
                }
                format!("/api/v1/student/schedule?{}&null", encode(&query)?)
            }
            Self::ExamSchedule {
                student_id,
                year,
                semester,
            } => format!(
                "/api/thoi-khoa-bieu/lich-thi-sinh-vien/v1?{}&null",
                encode(&[
                    ("masv", student_id.as_str()),
                    ("namhoc", year.as_str()),
                    ("hocky", semester.as_str()),
                ])?
            ),
            Self::GpaSummary { .. } => format!(
                "/api/share/ket-qua-hoc-tap/thong-tin-mo-ta-ctdt/v2?{}",
                encode(&[("tuychon", VIEW_ONLINE)])?
            ),
            Self::GpaDetail {
                student_id,
                semester_id,
            } => format!(
                "/api/share/ket-qua-hoc-tap/bang-diem-hoc-ky/v2?{}",
                encode(&[
                    ("masv", student_id.as_str()),
                    ("maHocKy", semester_id.as_str()),
                    ("tuychon", VIEW_ONLINE),
                ])?
            ),
            Self::TranscriptSummary { .. } => format!(
                "/api/share/ket-qua-hoc-tap/diem-trung-binh-tich-luy/v2?{}",
                encode(&[("tuychon", VIEW_ONLINE)])?
            ),
        };
        Ok(path)
    }

    /// POST body. The summary endpoints take the student id as a bare JSON string.
    pub(crate) fn body(&self) -> Option<String> {
        match self {
            Self::GpaSummary { student_id } | Self::TranscriptSummary { student_id } => {
                Some(serde_json::Value::String(student_id.clone()).to_string())
            }
            Self::GpaDetail { .. } => Some(String::new()),
            _ => None,
        }
    }

    pub(crate) fn sends_json(&self) -> bool {
        !matches!(self, Self::Info | Self::Schedule { .. })
    }

    /// App page the call is made from
    pub(crate) fn referer_path(&self) -> &'static str {
        match self {
            Self::ExamSchedule { .. } => "/app/he-thong-quan-ly/sinh-vien/lich-thi",
            Self::GpaSummary { .. } => "/app/sinh-vien/ket-qua-hoc-tap/chuong-trinh-dao-tao",
            _ => "/app/",
        }
    }
}

fn encode(pairs: &[(&str, &str)]) -> Result<String> {
    serde_urlencoded::to_string(pairs)
        .map_err(|e| EgressError::ConfigError(format!("cannot encode query: {}", e)))
}
