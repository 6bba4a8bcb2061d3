//! In-memory storage backend.
//!
//! Backs the local development harness and the test suite; data lives for
//! the lifetime of the process.

mod store;

pub use store::MemoryPanelStore;
