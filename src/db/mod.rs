pub mod connection;
pub mod memory_store;
pub mod repositories;
pub mod store;

// Re-export the connection module's functions for ease of use
pub use connection::{create_pool, ensure_schema, verify_connection};
pub use memory_store::MemoryProgressStore;
pub use repositories::ProgressRepository;
pub use store::{ProgressStore, StoreError};
