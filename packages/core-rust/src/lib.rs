//! API session core: tenant records, field values, and the authentication payload.

pub mod auth;
pub mod types;

pub use auth::{AuthenticationData, StringList};
pub use types::{TenantKey, TenantRecord, Value};
