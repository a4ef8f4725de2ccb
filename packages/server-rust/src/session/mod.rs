//! Per-request sessions.
//!
//! - [`SessionContext`]: identity, authorization and client of one request
//! - [`SessionClient`]: client record bound to its session
//! - [`SessionRef`]: non-owning back-reference stamped on session-bound instances
//! - [`SessionManager`]: owns the shared cache and creates sessions

mod client;
mod context;
mod manager;

pub use client::{SessionClient, SessionRef};
pub use context::{ClientLookup, SessionContext};
pub use manager::SessionManager;
