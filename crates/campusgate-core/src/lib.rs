//! CampusGate Core Types and Traits
//!
//! This crate provides the fundamental types shared by every CampusGate crate:
//! - Error taxonomy surfaced to the boundary layer
//! - Domain records produced by the registration portal parser
//! - Session records and the `SessionStore` trait
//! - Log masking helpers for upstream credentials

pub mod error;
pub mod masking;
pub mod records;
pub mod session;
pub mod session_store;

pub use error::{Error, Result};
pub use session::{
    CookieSet, MAX_TRACKED_PERIODS, PeriodContext, SecondaryLoginState, SessionRecord,
    SessionUpdate,
};
pub use session_store::SessionStore;
