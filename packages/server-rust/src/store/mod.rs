//! Client store implementations and the registry that resolves them.
//!
//! - [`InMemoryClientStore`]: `DashMap`-backed store for fixtures and tests
//! - [`NullClientStore`]: knows no clients
//! - [`ClientStoreRegistry`]: maps a model location to the store the host registered there

mod memory;
mod null;
mod registry;

pub use memory::InMemoryClientStore;
pub use null::NullClientStore;
pub use registry::{ClientStoreRegistry, StoreFactory};
