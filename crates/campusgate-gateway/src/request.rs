//! Registration portal and student app requests, and their parsed results

use campusgate_core::records::{
    CancellationOutcome, ClassGroup, PeriodOverview, PeriodSummary, RegistrationOutcome,
    RegistrationPeriod, SearchHit,
};
use campusgate_core::{Error, Result};
use campusgate_egress::StudentApiCall;
use serde::Serialize;

/// One operation against the registration portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationRequest {
    /// Registration periods listed on the form page
    Periods,

    /// Select a period, capture its round and load window and registered courses
    PeriodDetails { period_id: String },

    /// Search the selected period's offering; `force` skips refreshing the result view
    SearchCourses {
        period_id: String,
        query: String,
        force: bool,
    },

    ClassGroups {
        period_id: String,
        course_id: String,
    },

    RegistrationResult { period_id: String },

    /// Register a class group; `course_id` primes the group list first unless `force`
    Register {
        period_id: String,
        group_id: String,
        course_id: Option<String>,
        force: bool,
    },

    Cancel {
        period_id: String,
        entry_id: String,
        course_code: Option<String>,
    },
}

impl RegistrationRequest {
    /// Label used for metrics and logs
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Periods => "periods",
            Self::PeriodDetails { .. } => "period_details",
            Self::SearchCourses { .. } => "search_courses",
            Self::ClassGroups { .. } => "class_groups",
            Self::RegistrationResult { .. } => "registration_result",
            Self::Register { .. } => "register",
            Self::Cancel { .. } => "cancel",
        }
    }

    /// Period the request is scoped to
    pub fn period_id(&self) -> Option<&str> {
        match self {
            Self::Periods => None,
            Self::PeriodDetails { period_id }
            | Self::SearchCourses { period_id, .. }
            | Self::ClassGroups { period_id, .. }
            | Self::RegistrationResult { period_id }
            | Self::Register { period_id, .. }
            | Self::Cancel { period_id, .. } => Some(period_id),
        }
    }

    /// Whether the period must have been opened with `PeriodDetails` first
    pub fn needs_period_context(&self) -> bool {
        !matches!(self, Self::Periods | Self::PeriodDetails { .. })
    }

    /// Reject blank identifiers before anything is sent upstream
    pub fn validate(&self) -> Result<()> {
        if let Some(period_id) = self.period_id() {
            require("periodId", period_id)?;
        }
        match self {
            Self::SearchCourses { query, .. } => require("query", query),
            Self::ClassGroups { course_id, .. } => require("monHocId", course_id),
            Self::Register { group_id, .. } => require("nlmhId", group_id),
            Self::Cancel { entry_id, .. } => require("ketquaId", entry_id),
            _ => Ok(()),
        }
    }
}

/// One read against the student app. A missing student id means the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentRequest {
    Info,
    Schedule {
        student_id: Option<String>,
        semester: Option<String>,
    },
    ExamSchedule {
        student_id: Option<String>,
        year: String,
        semester: String,
    },
    GpaSummary { student_id: Option<String> },
    GpaDetail {
        student_id: Option<String>,
        semester_id: String,
    },
    TranscriptSummary { student_id: Option<String> },
}

impl StudentRequest {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ExamSchedule { year, semester, .. } => {
                require("namhoc", year)?;
                require("hocky", semester)
            }
            Self::GpaDetail { semester_id, .. } => require("hocKyId", semester_id),
            _ => Ok(()),
        }
    }

    /// Upstream call for the session of `username`
    pub fn into_call(self, username: &str) -> StudentApiCall {
        let student = |id: Option<String>| {
            id.map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| username.to_string())
        };

        match self {
            Self::Info => StudentApiCall::Info,
            Self::Schedule {
                student_id,
                semester,
            } => StudentApiCall::Schedule {
                student_id: student(student_id),
                semester: semester.filter(|s| !s.trim().is_empty()),
            },
            Self::ExamSchedule {
                student_id,
                year,
                semester,
            } => StudentApiCall::ExamSchedule {
                student_id: student(student_id),
                year,
                semester,
            },
            Self::GpaSummary { student_id } => StudentApiCall::GpaSummary {
                student_id: student(student_id),
            },
            Self::GpaDetail {
                student_id,
                semester_id,
            } => StudentApiCall::GpaDetail {
                student_id: student(student_id),
                semester_id,
            },
            Self::TranscriptSummary { student_id } => StudentApiCall::TranscriptSummary {
                student_id: student(student_id),
            },
        }
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidRequest(format!("{} required", field)));
    }
    Ok(())
}

/// Parsed result of a `RegistrationRequest`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RegistrationData {
    Periods(Vec<RegistrationPeriod>),
    PeriodDetails(PeriodOverview),
    SearchResults(Vec<SearchHit>),
    ClassGroups(Vec<ClassGroup>),
    RegistrationResult(PeriodSummary),
    Registration(RegistrationOutcome),
    Cancellation(CancellationOutcome),
}
