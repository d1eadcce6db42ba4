//! CampusGate Egress Connectors
//!
//! This crate provides HTTP connectors to the two university portals:
//! - Identity (CAS) portal login with bearer token and profile discovery
//! - Course registration portal login and authenticated form calls
//! - Student app API calls (timetable, exams, grades) with the primary login

pub mod bearer;
pub mod cas;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod registration;
pub mod student;

pub use client::HttpClientConfig;
pub use config::PortalConfig;
pub use error::{EgressError, Result};
pub use identity::{IdentityConnector, PrimaryLogin, accepted_profile};
pub use registration::{RegistrationConnector, RegistrationSession, SecondaryLogin};
pub use student::StudentApiCall;

use campusgate_core::CookieSet;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};

/// Cookies the jar would send to `url`
pub(crate) fn cookies_for(jar: &Jar, url: &Url) -> CookieSet {
    jar.cookies(url)
        .and_then(|value| value.to_str().ok().map(CookieSet::new))
        .unwrap_or_default()
}
