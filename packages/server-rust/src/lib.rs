//! API session: per-request session context with a single-flight, TTL-bounded client cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod traits;

pub use api_session_core::{AuthenticationData, StringList, TenantKey, TenantRecord, Value};
pub use cache::ClientCache;
pub use config::{ClientCacheConfig, ClientModelSettings, StoreLocation};
pub use error::SessionError;
pub use session::{ClientLookup, SessionClient, SessionContext, SessionManager, SessionRef};
pub use store::{ClientStoreRegistry, InMemoryClientStore, NullClientStore};
pub use traits::{ClientStore, FetchOptions, SessionAware};
