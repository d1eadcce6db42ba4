//! CampusGate session store
//!
//! This crate provides the in-process implementation of
//! `campusgate_core::SessionStore`:
//! - bounded, in-memory storage with sliding expiry
//! - secure token generation
//! - a background sweep that drops expired sessions

pub mod config;
pub mod memory_store;
pub mod sweeper;
pub mod token;

pub use config::SessionConfig;
pub use memory_store::InMemorySessionStore;
pub use sweeper::{SweepTask, spawn_sweep_task};
pub use token::generate_secure_token;
