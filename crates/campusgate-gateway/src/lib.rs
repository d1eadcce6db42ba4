//! CampusGate Gateway
//!
//! The boundary the HTTP layer talks to. `AuthenticationOrchestrator` owns the
//! login flow across both portals and runs registration portal operations and
//! student app reads on behalf of a session token.

pub mod orchestrator;
pub mod request;

pub use orchestrator::{AuthenticationOrchestrator, LoginOutcome, SessionStatus};
pub use request::{RegistrationData, RegistrationRequest, StudentRequest};
