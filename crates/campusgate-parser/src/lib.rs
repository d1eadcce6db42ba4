//! CampusGate HTML parser
//!
//! Turns the HTML fragments and JSON snippets returned by the course
//! registration portal into the domain records of `campusgate_core::records`:
//! - class groups and their weekly schedules
//! - course search hits
//! - registration window and registered-course summary of a period
//! - registration periods, round ids and register-action replies
//!
//! Every function is pure. Malformed or unexpected markup never panics and
//! never errors: rows that do not match are skipped, missing values fall back
//! to empty strings or zero.

pub mod class_groups;
pub mod date;
mod markup;
pub mod period_details;
pub mod periods;
pub mod registration;
pub mod schedule;
pub mod search;

pub use class_groups::parse_class_groups_html;
pub use date::parse_vietnamese_date;
pub use period_details::parse_period_details_html;
pub use periods::{MAX_PERIODS, parse_registration_periods_html};
pub use registration::{parse_registration_response, parse_round_ids};
pub use schedule::parse_schedule_html;
pub use search::parse_search_results_html;
